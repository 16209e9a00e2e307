//! Channel pattern analyzer.
//!
//! Loads a channel's reference thumbnails concurrently, extracts per-image
//! visual features and aggregates them into a [`ChannelPattern`]. Results
//! are cached per channel; a cache hit performs no image loads at all.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use regex::Regex;
use tokio::sync::Semaphore;
use tracing::{debug, info, info_span, warn, Instrument};
use vthumb_models::{
    ChannelPattern, PalettePattern, PatternStat, ReferenceThumbnail, TemporalTrend,
};
use vthumb_providers::ImageFetcher;

use crate::cache::{Clock, PatternCache, SystemClock};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::metrics::{record_analysis, record_cache_lookup, record_image};
use crate::palette::{to_hex, ColorFamily, PALETTE_SIZE};
use crate::visual::{analyze_image, ImageFeatures, Layout, TextStyle};

/// Below this many recurring pattern instances confidence is capped.
pub const MIN_PATTERN_INSTANCES: usize = 6;
/// Confidence ceiling for thin evidence.
pub const LOW_EVIDENCE_CONFIDENCE_CAP: f64 = 0.4;

/// Dated samples needed before older and newer halves are compared.
const MIN_TREND_SAMPLES: usize = 4;

static SERIES_MARKERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("episode", r"(?i)\b(?:ep|episode)\.?\s*#?\d+"),
        ("part", r"(?i)\b(?:part|pt)\.?\s*#?\d+"),
        ("day-series", r"(?i)\bday\s*#?\d+"),
        ("numbered-list", r"^\s*(?i:top\s+)?\d+\s+\p{L}"),
        ("bracket-tag", r"[\[\(【][^\]\)】]{2,}[\]\)】]"),
        ("versus", r"(?i)\b(?:vs\.?|versus)\s"),
        ("question", r"\?\s*$"),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
    .collect()
});

/// A thumbnail whose features were extracted successfully.
#[derive(Debug, Clone)]
pub struct AnalyzedThumbnail {
    pub title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub features: ImageFeatures,
}

/// Cached channel pattern analyzer.
#[derive(Clone)]
pub struct PatternAnalyzer {
    fetcher: Arc<dyn ImageFetcher>,
    cache: Arc<dyn PatternCache>,
    clock: Arc<dyn Clock>,
    config: AnalysisConfig,
}

impl PatternAnalyzer {
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        cache: Arc<dyn PatternCache>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Analyze a channel's thumbnails, serving from cache when fresh.
    pub async fn analyze(
        &self,
        channel_id: &str,
        thumbnails: &[ReferenceThumbnail],
    ) -> AnalysisResult<ChannelPattern> {
        let span = info_span!("pattern_analysis", channel_id = %channel_id);

        async {
            if let Some(pattern) = self.cache.get(channel_id).await {
                record_cache_lookup(true);
                debug!("Pattern cache HIT");
                return Ok(pattern);
            }
            record_cache_lookup(false);

            let required = self.config.min_sample_size;
            if thumbnails.len() < required {
                return Err(AnalysisError::insufficient(required, thumbnails.len()));
            }

            let start = Instant::now();
            let samples = self.load_samples(thumbnails).await;
            if samples.len() < required {
                warn!(
                    requested = thumbnails.len(),
                    analyzed = samples.len(),
                    "Too few thumbnails could be analyzed"
                );
                return Err(AnalysisError::insufficient(required, samples.len()));
            }

            let pattern = aggregate_pattern(channel_id, &samples, self.clock.now());
            self.cache.put(channel_id, pattern.clone()).await;

            record_analysis(start.elapsed().as_millis() as f64);
            info!(
                sample_size = pattern.sample_size,
                confidence = pattern.confidence,
                "Channel pattern analyzed"
            );
            Ok(pattern)
        }
        .instrument(span)
        .await
    }

    /// Load and analyze thumbnails concurrently, skipping failures.
    async fn load_samples(&self, thumbnails: &[ReferenceThumbnail]) -> Vec<AnalyzedThumbnail> {
        let semaphore = Semaphore::new(self.config.max_concurrent_loads.max(1));

        let futures = thumbnails.iter().map(|thumbnail| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| AnalysisError::internal("load semaphore closed"))?;
                self.load_one(thumbnail).await
            }
        });

        let mut samples = Vec::with_capacity(thumbnails.len());
        for (thumbnail, result) in thumbnails.iter().zip(join_all(futures).await) {
            match result {
                Ok(features) => {
                    record_image(true);
                    samples.push(AnalyzedThumbnail {
                        title: thumbnail.title.clone(),
                        published_at: thumbnail.published_at,
                        features,
                    });
                }
                Err(e) => {
                    record_image(false);
                    warn!(url = %thumbnail.url, "Skipping thumbnail: {}", e);
                }
            }
        }
        samples
    }

    async fn load_one(&self, thumbnail: &ReferenceThumbnail) -> AnalysisResult<ImageFeatures> {
        let bytes = self
            .fetcher
            .fetch(&thumbnail.url)
            .await
            .map_err(|e| AnalysisError::image_load(&thumbnail.url, e))?;

        let sample_width = self.config.sample_width;
        tokio::task::spawn_blocking(move || analyze_image(&bytes, sample_width))
            .await
            .map_err(|e| AnalysisError::internal(format!("analysis task failed: {}", e)))?
            .map_err(|e| AnalysisError::image_decode(&thumbnail.url, e.to_string()))
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// Aggregate analyzed thumbnails into a channel pattern.
pub fn aggregate_pattern(
    channel_id: &str,
    samples: &[AnalyzedThumbnail],
    now: DateTime<Utc>,
) -> ChannelPattern {
    let sample_size = samples.len();

    let text_styles = stats(
        samples.iter().map(|s| s.features.text_style.as_str()),
        sample_size,
    );
    let layouts = stats(samples.iter().map(|s| s.features.layout.as_str()), sample_size);
    let color_palettes = palette_patterns(samples);
    let series_patterns = series_patterns(samples);
    let temporal_trends = temporal_trends(samples);

    let confidence = confidence(&text_styles, &color_palettes, &layouts, &series_patterns);

    ChannelPattern {
        channel_id: channel_id.to_string(),
        text_styles,
        color_palettes,
        layouts,
        series_patterns,
        temporal_trends,
        sample_size,
        confidence,
        analyzed_at: now,
    }
}

/// Count names; sorted by occurrences descending, then name.
fn stats<'a>(names: impl Iterator<Item = &'a str>, sample_size: usize) -> Vec<PatternStat> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }

    let mut stats: Vec<PatternStat> = counts
        .into_iter()
        .map(|(name, occurrences)| PatternStat {
            name: name.to_string(),
            occurrences,
            frequency: frequency(occurrences, sample_size),
        })
        .collect();
    stats.sort_by(|a, b| b.occurrences.cmp(&a.occurrences).then(a.name.cmp(&b.name)));
    stats
}

fn frequency(occurrences: usize, sample_size: usize) -> f64 {
    if sample_size == 0 {
        0.0
    } else {
        occurrences as f64 / sample_size as f64
    }
}

/// Group thumbnails by dominant colour family.
///
/// Representative colours are ranked by palette position across the group:
/// a colour in first place scores [`PALETTE_SIZE`], in last place 1.
fn palette_patterns(samples: &[AnalyzedThumbnail]) -> Vec<PalettePattern> {
    let mut groups: BTreeMap<ColorFamily, (usize, BTreeMap<String, usize>)> = BTreeMap::new();

    for sample in samples {
        let (occurrences, colors) = groups.entry(sample.features.family).or_default();
        *occurrences += 1;
        for (rank, rgb) in sample.features.palette.iter().enumerate() {
            *colors.entry(to_hex(*rgb)).or_default() += PALETTE_SIZE.saturating_sub(rank);
        }
    }

    let mut patterns: Vec<PalettePattern> = groups
        .into_iter()
        .map(|(family, (occurrences, colors))| {
            let mut ranked: Vec<(String, usize)> = colors.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

            PalettePattern {
                name: family.as_str().to_string(),
                colors: ranked
                    .into_iter()
                    .take(PALETTE_SIZE)
                    .map(|(hex, _)| hex)
                    .collect(),
                occurrences,
                frequency: frequency(occurrences, samples.len()),
            }
        })
        .collect();

    patterns.sort_by(|a, b| b.occurrences.cmp(&a.occurrences).then(a.name.cmp(&b.name)));
    patterns
}

fn series_patterns(samples: &[AnalyzedThumbnail]) -> Vec<PatternStat> {
    let matched = samples.iter().flat_map(|sample| {
        let title = sample.title.as_deref().unwrap_or("");
        SERIES_MARKERS
            .iter()
            .filter(move |(_, re)| re.is_match(title))
            .map(|(name, _)| *name)
    });
    stats(matched, samples.len())
}

/// Most common value; ties go to the smallest.
fn mode<T: Ord + Copy>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

fn temporal_trends(samples: &[AnalyzedThumbnail]) -> Vec<TemporalTrend> {
    let mut dated: Vec<(&DateTime<Utc>, &ImageFeatures)> = samples
        .iter()
        .filter_map(|s| s.published_at.as_ref().map(|at| (at, &s.features)))
        .collect();
    dated.sort_by_key(|(at, _)| **at);

    let mut trends = Vec::new();

    if dated.len() >= 3 {
        let mut gaps: Vec<i64> = dated
            .windows(2)
            .map(|w| w[1].0.signed_duration_since(*w[0].0).num_hours())
            .collect();
        gaps.sort_unstable();
        let median_days = gaps[gaps.len() / 2] as f64 / 24.0;
        let description = if median_days < 1.0 {
            "Multiple uploads per day".to_string()
        } else {
            format!("Uploads roughly every {} days", median_days.round() as i64)
        };
        trends.push(TemporalTrend {
            kind: "upload_cadence".to_string(),
            description,
        });
    }

    if dated.len() < MIN_TREND_SAMPLES {
        return trends;
    }

    let (older, newer) = dated.split_at(dated.len() / 2);

    let shift = |kind: &str, label: &str, before: Option<&'static str>, after: Option<&'static str>| {
        match (before, after) {
            (Some(before), Some(after)) if before != after => Some(TemporalTrend {
                kind: kind.to_string(),
                description: format!("{} shifted from {} to {}", label, before, after),
            }),
            _ => None,
        }
    };

    let layout_of = |half: &[(&DateTime<Utc>, &ImageFeatures)]| {
        mode(half.iter().map(|(_, f)| f.layout)).map(|l: Layout| l.as_str())
    };
    let family_of = |half: &[(&DateTime<Utc>, &ImageFeatures)]| {
        mode(half.iter().map(|(_, f)| f.family)).map(|c: ColorFamily| c.as_str())
    };
    let text_of = |half: &[(&DateTime<Utc>, &ImageFeatures)]| {
        mode(half.iter().map(|(_, f)| f.text_style)).map(|t: TextStyle| t.as_str())
    };

    trends.extend(shift("layout_shift", "Layout", layout_of(older), layout_of(newer)));
    trends.extend(shift("palette_shift", "Dominant colour", family_of(older), family_of(newer)));
    trends.extend(shift("text_style_shift", "Text style", text_of(older), text_of(newer)));

    trends
}

/// Mean of the top text-style, palette and layout frequencies, capped when
/// fewer than [`MIN_PATTERN_INSTANCES`] recurring instances back it.
fn confidence(
    text_styles: &[PatternStat],
    palettes: &[PalettePattern],
    layouts: &[PatternStat],
    series: &[PatternStat],
) -> f64 {
    let top = |stats: &[PatternStat]| stats.first().map(|s| s.frequency).unwrap_or(0.0);
    let top_palette = palettes.first().map(|p| p.frequency).unwrap_or(0.0);
    let mean = (top(text_styles) + top_palette + top(layouts)) / 3.0;

    let recurring = |occurrences: usize| if occurrences >= 2 { occurrences } else { 0 };
    let instances: usize = text_styles
        .iter()
        .chain(layouts)
        .chain(series)
        .map(|s| recurring(s.occurrences))
        .sum::<usize>()
        + palettes.iter().map(|p| recurring(p.occurrences)).sum::<usize>();

    let confidence = if instances < MIN_PATTERN_INSTANCES {
        mean.min(LOW_EVIDENCE_CONFIDENCE_CAP)
    } else {
        mean
    };
    confidence.clamp(0.0, 1.0)
}

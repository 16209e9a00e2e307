//! Per-thumbnail visual feature extraction.
//!
//! Layout is read from where visual mass (luma distance from the background)
//! sits horizontally. Text style is a heuristic: rendered captions produce
//! dense runs of strong horizontal luma edges, so edge density in the top,
//! centre and bottom bands stands in for OCR.

use std::fmt;

use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbImage};

use crate::palette::{extract_palette, ColorFamily};

/// Luma step that counts as a strong edge.
const EDGE_THRESHOLD: f32 = 60.0;
/// Edge density at which a band is considered to carry text.
const TEXT_DENSITY: f32 = 0.10;
/// A text band must be this much denser than the band it is compared to.
const BAND_DOMINANCE: f32 = 1.5;
/// Share of visual mass that makes a third dominant.
const DOMINANT_SHARE: f32 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layout {
    Centered,
    LeftWeighted,
    RightWeighted,
    Split,
    Balanced,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Centered => "centered",
            Layout::LeftWeighted => "left-weighted",
            Layout::RightWeighted => "right-weighted",
            Layout::Split => "split",
            Layout::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextStyle {
    NoText,
    TopBanner,
    BottomBanner,
    TopAndBottom,
    BoldCenter,
}

impl TextStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextStyle::NoText => "no-text",
            TextStyle::TopBanner => "top-banner",
            TextStyle::BottomBanner => "bottom-banner",
            TextStyle::TopAndBottom => "top-and-bottom",
            TextStyle::BoldCenter => "bold-center",
        }
    }
}

impl fmt::Display for TextStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Features extracted from one thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFeatures {
    /// Most frequent colours first.
    pub palette: Vec<[u8; 3]>,
    pub family: ColorFamily,
    pub layout: Layout,
    pub text_style: TextStyle,
}

/// Decode an encoded image and extract its features.
pub fn analyze_image(bytes: &[u8], sample_width: u32) -> Result<ImageFeatures, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    Ok(extract_features(&downsample(&img, sample_width)))
}

fn downsample(img: &DynamicImage, sample_width: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    if width <= sample_width || width == 0 {
        return img.to_rgb8();
    }
    let sample_height = ((height as u64 * sample_width as u64) / width as u64).max(1) as u32;
    img.resize_exact(sample_width, sample_height, FilterType::Triangle)
        .to_rgb8()
}

pub fn extract_features(img: &RgbImage) -> ImageFeatures {
    let palette = extract_palette(img);
    let family = palette
        .first()
        .copied()
        .map(ColorFamily::of)
        .unwrap_or(ColorFamily::Neutral);

    ImageFeatures {
        palette,
        family,
        layout: detect_layout(img),
        text_style: detect_text_style(img),
    }
}

fn luma_grid(img: &RgbImage) -> Vec<Vec<f32>> {
    (0..img.height())
        .map(|y| {
            (0..img.width())
                .map(|x| {
                    let [r, g, b] = img.get_pixel(x, y).0;
                    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
                })
                .collect()
        })
        .collect()
}

/// Median luma of the outermost ring of pixels.
fn background_luma(luma: &[Vec<f32>]) -> f32 {
    let height = luma.len();
    let width = luma.first().map(Vec::len).unwrap_or(0);
    let mut border: Vec<f32> = Vec::with_capacity(2 * (width + height));

    for (y, row) in luma.iter().enumerate() {
        if y == 0 || y + 1 == height {
            border.extend_from_slice(row);
        } else if width > 0 {
            border.push(row[0]);
            border.push(row[width - 1]);
        }
    }

    if border.is_empty() {
        return 0.0;
    }
    border.sort_by(f32::total_cmp);
    border[border.len() / 2]
}

pub fn detect_layout(img: &RgbImage) -> Layout {
    let width = img.width() as usize;
    if width < 3 || img.height() == 0 {
        return Layout::Balanced;
    }

    let luma = luma_grid(img);
    let background = background_luma(&luma);

    let mut columns = vec![0.0f32; width];
    for row in &luma {
        for (x, value) in row.iter().enumerate() {
            columns[x] += (value - background).abs();
        }
    }

    let total: f32 = columns.iter().sum();
    if total <= f32::EPSILON {
        return Layout::Balanced;
    }

    let third = width / 3;
    let left: f32 = columns[..third].iter().sum::<f32>() / total;
    let center: f32 = columns[third..width - third].iter().sum::<f32>() / total;
    let right: f32 = columns[width - third..].iter().sum::<f32>() / total;

    if left >= 0.35 && right >= 0.35 && center < 0.2 {
        Layout::Split
    } else if center >= DOMINANT_SHARE {
        Layout::Centered
    } else if left >= DOMINANT_SHARE {
        Layout::LeftWeighted
    } else if right >= DOMINANT_SHARE {
        Layout::RightWeighted
    } else {
        Layout::Balanced
    }
}

/// Fraction of horizontally adjacent pixel pairs in `rows` with a strong edge.
fn edge_density(luma: &[Vec<f32>], rows: std::ops::Range<usize>) -> f32 {
    let mut edges = 0usize;
    let mut pairs = 0usize;

    for row in &luma[rows] {
        for pair in row.windows(2) {
            pairs += 1;
            if (pair[1] - pair[0]).abs() > EDGE_THRESHOLD {
                edges += 1;
            }
        }
    }

    if pairs == 0 {
        0.0
    } else {
        edges as f32 / pairs as f32
    }
}

pub fn detect_text_style(img: &RgbImage) -> TextStyle {
    let height = img.height() as usize;
    if height < 4 || img.width() < 2 {
        return TextStyle::NoText;
    }

    let luma = luma_grid(img);
    let quarter = height / 4;

    let top = edge_density(&luma, 0..quarter);
    let bottom = edge_density(&luma, height - quarter..height);
    let center = edge_density(&luma, (3 * height / 8)..(5 * height / 8).max(3 * height / 8 + 1));

    let top_text = top >= TEXT_DENSITY && top >= center * BAND_DOMINANCE;
    let bottom_text = bottom >= TEXT_DENSITY && bottom >= center * BAND_DOMINANCE;

    match (top_text, bottom_text) {
        (true, true) => TextStyle::TopAndBottom,
        (true, false) => TextStyle::TopBanner,
        (false, true) => TextStyle::BottomBanner,
        _ if center >= TEXT_DENSITY && center >= top.max(bottom) * BAND_DOMINANCE => {
            TextStyle::BoldCenter
        }
        _ => TextStyle::NoText,
    }
}

//! Channel style service: dictionary, pattern and profile in one call.

use serde::Serialize;
use tracing::info;
use vthumb_models::{
    ChannelDictionary, ChannelDocument, ChannelPattern, ReferenceThumbnail, StyleProfile,
};

use crate::dictionary::build_dictionary;
use crate::error::AnalysisResult;
use crate::patterns::PatternAnalyzer;
use crate::profile::derive_profile;

/// Everything prompt composition needs to know about a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStyle {
    pub dictionary: ChannelDictionary,
    pub pattern: ChannelPattern,
    pub profile: StyleProfile,
}

#[derive(Clone)]
pub struct ChannelStyleService {
    analyzer: PatternAnalyzer,
}

impl ChannelStyleService {
    pub fn new(analyzer: PatternAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Build the dictionary and analyze thumbnails (cached) for a channel.
    pub async fn analyze(
        &self,
        channel_id: &str,
        documents: &[ChannelDocument],
        thumbnails: &[ReferenceThumbnail],
    ) -> AnalysisResult<ChannelStyle> {
        let dictionary = build_dictionary(channel_id, documents, self.analyzer.clock().now());
        let pattern = self.analyzer.analyze(channel_id, thumbnails).await?;
        let profile = derive_profile(Some(&dictionary), &pattern);

        info!(
            channel_id = %channel_id,
            niche = %dictionary.niche,
            style_id = %profile.style_id,
            "Channel style derived"
        );

        Ok(ChannelStyle {
            dictionary,
            pattern,
            profile,
        })
    }
}

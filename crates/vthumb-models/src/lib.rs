//! Shared data models for the VThumb backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video briefs and languages
//! - Generation options, cost tiers and creative directions
//! - Generation tasks, results and reports
//! - Channel dictionaries, patterns and style profiles

pub mod channel;
pub mod generation;
pub mod options;
pub mod style;
pub mod video;

// Re-export common types
pub use channel::{
    ChannelDictionary, ChannelDocument, ChannelPattern, KeywordWeight, PalettePattern,
    PatternStat, ReferenceThumbnail, TemporalTrend,
};
pub use generation::{
    GenerationReport, GenerationResult, GenerationTask, ImageRef, RequestId, TaskFailure,
};
pub use options::{
    CostTier, CreativeDirection, CreatorType, GenerationOptions, ImageQuality, Participant,
    ParticipantEmphasis, ParticipantPosition, ParseEnumError,
};
pub use style::{StyleProfile, StyleVariation};
pub use video::{Language, TextDirection, VideoContext};

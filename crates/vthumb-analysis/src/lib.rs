//! Channel style analysis.
//!
//! This crate provides:
//! - TF-IDF channel dictionaries with niche/category classification
//! - Pixel-based thumbnail features (palette, layout, text style)
//! - Channel pattern aggregation with a TTL cache
//! - Style profile derivation for prompt composition

pub mod cache;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod metrics;
pub mod palette;
pub mod patterns;
pub mod profile;
pub mod service;
pub mod visual;

pub use cache::{CacheEntry, Clock, InMemoryPatternCache, ManualClock, PatternCache, SystemClock};
pub use config::AnalysisConfig;
pub use dictionary::{build_dictionary, tokenize};
pub use error::{AnalysisError, AnalysisResult};
pub use patterns::PatternAnalyzer;
pub use profile::derive_profile;
pub use service::{ChannelStyle, ChannelStyleService};

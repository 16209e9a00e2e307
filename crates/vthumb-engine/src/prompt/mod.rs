//! Prompt composition: scene reasoning followed by deterministic assembly.

pub mod assembly;
pub mod composer;
pub mod cultural;

pub use assembly::{assemble_prompt, IntensityBand, PromptInputs};
pub use composer::{contextual_summary, Scene, SceneComposer, SceneRequest};
pub use cultural::{creator_guidance, cultural_hint, has_cultural_hint, participant_placement};

// crates/chrysalis-core/src/prompt.rs
//
// Prompt and transformation-strength composition per evolution stage.

use serde::{Deserialize, Serialize};

use crate::lookup::StageTable;

/// Intensity phrases in increasing order of transformation.
pub const INTENSITY_PHRASES: StageTable<5> = StageTable::new([
    "slightly enhanced, beginning to change",
    "moderately evolved, gaining new features",
    "significantly transformed, with new colors and details",
    "dramatically evolved, with complex structures and details",
    "ultimate legendary form with cosmic powers",
]);

/// Quality and style suffix appended to every prompt.
pub const STYLE_SUFFIX: &str = "detailed, high quality, on ApeChain blockchain";

/// Negative prompt sent with every transformation.
pub const NEGATIVE_PROMPT: &str = "blurry, low quality, distorted";

pub const BASE_STRENGTH: f64 = 0.3;
pub const STRENGTH_STEP: f64 = 0.1;

/// Generation parameters for one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedPrompt {
    pub prompt: String,
    /// Unclamped; callers fit it to their backend's accepted range.
    pub strength: f64,
}

/// Build the prompt and strength for `stage` from the collectible's description.
pub fn compose(base_description: &str, stage: u32) -> ComposedPrompt {
    let phrase = INTENSITY_PHRASES.get(stage);

    ComposedPrompt {
        prompt: format!("{}, {}, {}", base_description, phrase, STYLE_SUFFIX),
        strength: strength_for(stage),
    }
}

/// `0.3 + stage * 0.1`, growing without bound.
pub fn strength_for(stage: u32) -> f64 {
    BASE_STRENGTH + f64::from(stage) * STRENGTH_STEP
}

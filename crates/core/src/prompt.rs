//! Natural-language instructions sent with each image request.

use crate::error::{AppError, Result};
use crate::model::{AccentColor, ThumbnailRequest, BATCH_SIZE};

/// One look per candidate in a batch.
pub const STYLE_VARIANTS: [&str; BATCH_SIZE] = [
    "Masterpiece quality, extreme cinematic contrast, dramatic deep shadows, epic teal and orange color grading.",
    "Dynamic action-movie composition, anamorphic lens flares, intense atmospheric depth with volumetric god rays.",
    "Hyper-vibrant studio glows, cinematic fog, rich saturated lighting, professional rim lighting with high specular highlights.",
];

/// Horizontal position of the presenter per candidate. All sit in the right
/// two-fifths of the frame.
pub const SUBJECT_POSITIONS: [&str; BATCH_SIZE] = ["82%", "88%", "78%"];

pub const DEFAULT_SUGGESTION: &str = "Enhance cinematic quality";

/// Output shape requested from the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub aspect_ratio: String,
    pub size_tier: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: "16:9".to_string(),
            size_tier: "1K".to_string(),
        }
    }
}

impl RenderOptions {
    fn instruction(&self) -> String {
        format!(
            "OUTPUT: a single {} landscape frame at {} resolution tier.",
            self.aspect_ratio, self.size_tier
        )
    }
}

pub fn generation_prompt(
    request: &ThumbnailRequest,
    variation: usize,
    options: &RenderOptions,
) -> Result<String> {
    let style = STYLE_VARIANTS
        .get(variation)
        .ok_or_else(|| AppError::gemini(format!("variation index {variation} is out of range")))?;
    let position = SUBJECT_POSITIONS[variation];
    let color = request.accent_color.hex();

    Ok(format!(
        r#"Create a world-class, hyper-realistic professional YouTube thumbnail.
VISUAL STYLE: {style}

MAIN SUBJECT: High-fidelity reconstruction of the person from the reference image.
FACIAL EXPRESSION (CRITICAL): Modify the person's face to clearly show the emotion: "{emotion}".
The expression should be high-energy and viral-style (e.g. exaggerated eyes and mouth if shocked, intense focus if serious).

FRAMING: {framing}.
SUBJECT POSITION: Place the presenter at horizontal position {position} (strictly on the RIGHT side of the frame) and vertical center.
The presenter must NOT be centered; push them towards the right edge to leave the left 60% of the frame clear for text.

CINEMATIC LIGHTING & ATMOSPHERE (CRITICAL):
- Massive, intense "{color}" RIM LIGHTING (backlight) creating a sharp, glowing silhouette on the subject.
- ENVIRONMENT TINT: the entire background and ambient atmosphere (fog, smoke, details) MUST be heavily tinted and illuminated with the "{color}" color.
- The scene should feel immersed in a "{color}" light bath.
- Professional 3-point studio lighting with deep cinematic shadows.
- Volumetric atmosphere: subtle smoke, dust particles and thick "{color}" tinted fog for depth.

SCENE ENVIRONMENT: {theme}.

COMPOSITION:
- Cinematic 8K detail, ultra-sharp focus on the subject.
- Beautiful background bokeh (depth of field).
- Keep a clean, high-contrast area on the LEFT 60% of the frame for large text.
- NO text, logos or watermarks.
{output}"#,
        emotion = request.emotion.label(),
        framing = request.framing.label(),
        theme = request.theme.trim(),
        output = options.instruction(),
    ))
}

pub fn refine_prompt(suggestion: &str, accent: AccentColor, options: &RenderOptions) -> String {
    let suggestion = match suggestion.trim() {
        "" => DEFAULT_SUGGESTION,
        s => s,
    };
    let color = accent.hex();

    format!(
        r#"Refine and improve this professional thumbnail based on this suggestion: "{suggestion}".

POSITIONING: Keep the presenter well placed on the RIGHT side of the frame, following the current composition.

KEEP CURRENT CHARACTER AND EXPRESSION: maintain the exact same person and their current facial expression.
COLOR THEME (CRITICAL): intensely apply the "{color}" lighting theme to both the subject AND the background environment. The entire scene must be bathed in this color.

QUALITY UPGRADE:
- Increase contrast and cinematic sharpness.
- Make the "{color}" rim light and background glow even more intense and dramatic.
- Enhance volumetric fog and background depth.

STRICT: NO text, UI elements or watermarks in the image.
{output}"#,
        output = options.instruction(),
    )
}

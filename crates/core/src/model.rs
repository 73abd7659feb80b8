//! Request and result types shared by the wizard, the client and the compositor.

use crate::error::{AppError, Result};
use crate::image_processing::ImageData;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of candidates produced by one generation batch.
pub const BATCH_SIZE: usize = 3;

pub const TEXT_SIZE_RANGE: RangeInclusive<f32> = 80.0..=450.0;
pub const TEXT_Y_RANGE: RangeInclusive<f32> = 5.0..=95.0;
pub const TEXT_X_RANGE: RangeInclusive<f32> = 2.0..=45.0;
pub const TEXT_ROTATION_RANGE: RangeInclusive<f32> = -25.0..=25.0;
pub const PRESENTER_ZOOM_RANGE: RangeInclusive<f32> = 1.0..=2.0;
pub const PRESENTER_POSITION_RANGE: RangeInclusive<f32> = 0.0..=100.0;

/// Facial expression requested for the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Emotion {
    Shocked,
    Happy,
    Serious,
    Scared,
    Thoughtful,
    Angry,
    Laughing,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Shocked,
        Emotion::Happy,
        Emotion::Serious,
        Emotion::Scared,
        Emotion::Thoughtful,
        Emotion::Angry,
        Emotion::Laughing,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Emotion::Shocked => "shocked",
            Emotion::Happy => "happy",
            Emotion::Serious => "serious",
            Emotion::Scared => "scared",
            Emotion::Thoughtful => "thoughtful",
            Emotion::Angry => "angry",
            Emotion::Laughing => "laughing",
        }
    }

    /// Wording used inside the generation instruction.
    pub fn label(self) -> &'static str {
        match self {
            Emotion::Shocked => "Shocked/Surprised",
            Emotion::Happy => "Happy/Excited",
            Emotion::Serious => "Serious/Determined",
            Emotion::Scared => "Scared",
            Emotion::Thoughtful => "Thoughtful",
            Emotion::Angry => "Angry/Intense",
            Emotion::Laughing => "Laughing",
        }
    }
}

/// Camera framing of the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    ExtremeCloseUp,
    CloseUp,
    Medium,
    American,
    Wide,
}

impl Framing {
    pub const ALL: [Framing; 5] = [
        Framing::ExtremeCloseUp,
        Framing::CloseUp,
        Framing::Medium,
        Framing::American,
        Framing::Wide,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Framing::ExtremeCloseUp => "extreme-close-up",
            Framing::CloseUp => "close-up",
            Framing::Medium => "medium",
            Framing::American => "american",
            Framing::Wide => "wide",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Framing::ExtremeCloseUp => "Extreme close-up (focus on the face)",
            Framing::CloseUp => "Close-up (face and shoulders)",
            Framing::Medium => "Medium shot (chest up)",
            Framing::American => "American shot (waist up)",
            Framing::Wide => "Wide angle (subject and scenery)",
        }
    }
}

macro_rules! slug_from_str {
    ($ty:ident, $what:literal) => {
        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self> {
                let wanted = s.trim().to_ascii_lowercase();
                $ty::ALL
                    .into_iter()
                    .find(|v| v.slug() == wanted)
                    .ok_or_else(|| AppError::config(format!("unknown {} '{}'", $what, s)))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.slug())
            }
        }
    };
}

slug_from_str!(Emotion, "emotion");
slug_from_str!(Framing, "framing");

/// Lighting color applied to the scene, as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccentColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl AccentColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const PRESETS: [(&'static str, AccentColor); 7] = [
        ("red", AccentColor::rgb(0xFF, 0x1F, 0x1F)),
        ("yellow", AccentColor::rgb(0xFF, 0xE2, 0x00)),
        ("blue", AccentColor::rgb(0x00, 0xD4, 0xFF)),
        ("orange", AccentColor::rgb(0xFF, 0x5E, 0x00)),
        ("green", AccentColor::rgb(0x39, 0xFF, 0x14)),
        ("purple", AccentColor::rgb(0xBC, 0x13, 0xFE)),
        ("pink", AccentColor::rgb(0xFF, 0x00, 0x7F)),
    ];

    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for AccentColor {
    fn default() -> Self {
        Self::PRESETS[0].1
    }
}

impl FromStr for AccentColor {
    type Err = AppError;

    /// Accepts a preset name, `#RRGGBB` or `RRGGBB`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some((_, color)) = Self::PRESETS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
        {
            return Ok(*color);
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::config(format!("invalid accent color '{s}'")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| AppError::config(format!("invalid accent color '{s}'")))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for AccentColor {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AccentColor> for String {
    fn from(value: AccentColor) -> Self {
        value.hex()
    }
}

impl fmt::Display for AccentColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

/// Immutable input to a generation batch.
#[derive(Debug, Clone)]
pub struct ThumbnailRequest {
    pub presenter: ImageData,
    pub emotion: Emotion,
    pub overlay_text: String,
    pub theme: String,
    pub accent_color: AccentColor,
    pub framing: Framing,
}

/// Normalizes overlay text the way the editor shows it: upper case.
pub fn normalize_overlay_text(text: &str) -> String {
    text.to_uppercase()
}

/// Text and presenter adjustments of one result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutParams {
    pub text_size: f32,
    pub text_y: f32,
    pub text_x: f32,
    pub text_rotation: f32,
    pub presenter_zoom: f32,
    pub presenter_x: f32,
    pub presenter_y: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            text_size: 240.0,
            text_y: 50.0,
            text_x: 10.0,
            text_rotation: -4.0,
            presenter_zoom: 1.0,
            presenter_x: 50.0,
            presenter_y: 50.0,
        }
    }
}

impl LayoutParams {
    /// Every consumer reads parameters through this so preview and export agree.
    pub fn clamped(&self) -> Self {
        let d = Self::default();
        Self {
            text_size: clamp(self.text_size, &TEXT_SIZE_RANGE, d.text_size),
            text_y: clamp(self.text_y, &TEXT_Y_RANGE, d.text_y),
            text_x: clamp(self.text_x, &TEXT_X_RANGE, d.text_x),
            text_rotation: clamp(self.text_rotation, &TEXT_ROTATION_RANGE, d.text_rotation),
            presenter_zoom: clamp(self.presenter_zoom, &PRESENTER_ZOOM_RANGE, d.presenter_zoom),
            presenter_x: clamp(self.presenter_x, &PRESENTER_POSITION_RANGE, d.presenter_x),
            presenter_y: clamp(self.presenter_y, &PRESENTER_POSITION_RANGE, d.presenter_y),
        }
    }
}

fn clamp(value: f32, range: &RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(*range.start(), *range.end())
    } else {
        fallback
    }
}

/// Stable identifier of a result slot, also used in single-file export names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(String);

impl SlotId {
    /// Derives a short base36 id from a batch seed and the slot index.
    pub fn derive(seed: u64, index: usize) -> Self {
        let mut x = seed ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        x ^= x >> 33;
        x = x.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
        x ^= x >> 33;

        const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut out = String::with_capacity(9);
        for _ in 0..9 {
            out.push(ALPHABET[(x % 36) as usize] as char);
            x /= 36;
        }
        Self(out)
    }

    /// Seed for a new batch, taken from the wall clock.
    pub fn batch_seed() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SlotId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One generated candidate and its editor state.
#[derive(Debug, Clone)]
pub struct ThumbnailResult {
    pub id: SlotId,
    pub image: ImageData,
    pub overlay_text: String,
    pub params: LayoutParams,
    pub framing: Framing,
    pub suggestion: String,
    pub refining: bool,
}

impl ThumbnailResult {
    /// A fresh candidate with centered presenter and default text layout.
    pub fn new(id: SlotId, image: ImageData, overlay_text: &str, framing: Framing) -> Self {
        Self {
            id,
            image,
            overlay_text: normalize_overlay_text(overlay_text),
            params: LayoutParams::default(),
            framing,
            suggestion: String::new(),
            refining: false,
        }
    }

    pub fn apply(&mut self, update: &SlotUpdate) {
        if let Some(text) = &update.overlay_text {
            self.overlay_text = normalize_overlay_text(text);
        }
        if let Some(suggestion) = &update.suggestion {
            self.suggestion = suggestion.clone();
        }

        let p = &mut self.params;
        let fields = [
            (&mut p.text_size, update.text_size),
            (&mut p.text_y, update.text_y),
            (&mut p.text_x, update.text_x),
            (&mut p.text_rotation, update.text_rotation),
            (&mut p.presenter_zoom, update.presenter_zoom),
            (&mut p.presenter_x, update.presenter_x),
            (&mut p.presenter_y, update.presenter_y),
        ];
        for (field, value) in fields {
            if let Some(v) = value {
                *field = v;
            }
        }
        self.params = self.params.clamped();
    }
}

/// Partial update coming from the editor controls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotUpdate {
    pub overlay_text: Option<String>,
    pub text_size: Option<f32>,
    pub text_y: Option<f32>,
    pub text_x: Option<f32>,
    pub text_rotation: Option<f32>,
    pub presenter_zoom: Option<f32>,
    pub presenter_x: Option<f32>,
    pub presenter_y: Option<f32>,
    pub suggestion: Option<String>,
}

impl SlotUpdate {
    /// Parses a `key=value` assignment as typed in the terminal editor.
    ///
    /// Keys: `text`, `size`, `x`, `y`, `rotation`, `zoom`, `presenter-x`,
    /// `presenter-y`, `suggestion`. In `text`, a literal `\n` starts a new line.
    pub fn parse_assignment(input: &str) -> Result<Self> {
        let (key, value) = input
            .split_once('=')
            .ok_or_else(|| AppError::config(format!("expected key=value, got '{input}'")))?;
        let number = || {
            value
                .trim()
                .parse::<f32>()
                .map_err(|_| AppError::config(format!("'{}' is not a number", value.trim())))
        };

        let mut update = Self::default();
        match key.trim() {
            "text" => update.overlay_text = Some(value.replace("\\n", "\n")),
            "suggestion" => update.suggestion = Some(value.trim().to_string()),
            "size" => update.text_size = Some(number()?),
            "x" => update.text_x = Some(number()?),
            "y" => update.text_y = Some(number()?),
            "rotation" => update.text_rotation = Some(number()?),
            "zoom" => update.presenter_zoom = Some(number()?),
            "presenter-x" => update.presenter_x = Some(number()?),
            "presenter-y" => update.presenter_y = Some(number()?),
            other => return Err(AppError::config(format!("unknown setting '{other}'"))),
        }
        Ok(update)
    }
}

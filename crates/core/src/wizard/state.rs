//! Wizard state types.

use super::slots::Slots;
use crate::image_processing::ImageData;
use crate::model::{AccentColor, Emotion, Framing, ThumbnailRequest};

pub const DEFAULT_OVERLAY_TEXT: &str = "THIS IS\nINSANE!";

/// Outcome of the one-time credential check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialState {
    /// The host has not answered yet; nothing is shown.
    Unchecked,
    /// No usable key; only key selection is possible.
    Missing,
    Granted,
}

/// Current wizard step.
///
/// `Intro -> Photo -> Emotion -> Title -> Theme -> Review`
///
/// Only `Review` owns generated results, so a review without results cannot
/// be represented.
#[derive(Debug)]
pub enum Step {
    Intro,
    /// Presenter photo and framing.
    Photo,
    Emotion,
    /// Overlay title text.
    Title,
    /// Accent color, scene theme and generation.
    Theme,
    Review(Review),
}

impl Step {
    pub fn index(&self) -> usize {
        match self {
            Step::Intro => 0,
            Step::Photo => 1,
            Step::Emotion => 2,
            Step::Title => 3,
            Step::Theme => 4,
            Step::Review(_) => 5,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::Intro => "Welcome",
            Step::Photo => "Face & framing",
            Step::Emotion => "Expression",
            Step::Title => "Impact title",
            Step::Theme => "Light & scenery",
            Step::Review(_) => "Final adjustments",
        }
    }
}

/// Number of steps, for progress indicators.
pub const STEP_COUNT: usize = 6;

/// Generated batch being edited.
#[derive(Debug)]
pub struct Review {
    pub request: ThumbnailRequest,
    pub slots: Slots,
}

/// Choices collected before generation.
#[derive(Debug, Clone)]
pub struct Draft {
    pub presenter: Option<ImageData>,
    pub framing: Framing,
    pub emotion: Emotion,
    pub overlay_text: String,
    pub accent_color: AccentColor,
    pub theme: String,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            presenter: None,
            framing: Framing::ExtremeCloseUp,
            emotion: Emotion::Shocked,
            overlay_text: DEFAULT_OVERLAY_TEXT.to_string(),
            accent_color: AccentColor::default(),
            theme: String::new(),
        }
    }
}

impl Draft {
    pub fn has_title(&self) -> bool {
        !self.overlay_text.trim().is_empty()
    }

    pub fn has_theme(&self) -> bool {
        !self.theme.trim().is_empty()
    }
}

/// Progress of a running generation batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationProgress {
    pub completed: usize,
    pub total: usize,
}

impl GenerationProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.completed * 100 / self.total) as u8
    }
}

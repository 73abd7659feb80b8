//! ThumbMaster Core Library
//!
//! This library provides the core functionality for the ThumbMaster thumbnail
//! studio: a guided wizard that turns a presenter photo into three cinematic
//! 16:9 thumbnails, an editor for the overlay text and presenter framing, and
//! export to PNG or ZIP.
//!
//! # Overview
//!
//! - **Generation**: Gemini image generation and refinement via [`gemini`]
//! - **Wizard**: Step-by-step state machine via [`wizard`]
//! - **Compositing**: Final 1920×1080 render via [`compositor`] and [`geometry`]
//! - **Export**: Single PNG files and ZIP archives via [`export`]
//!
//! # Quick Start
//!
//! The simplest way to use the library is through the [`ThumbMaster`] facade:
//!
//! ```ignore
//! use thumbmaster_core::{CancelToken, ThumbMaster};
//!
//! let studio = ThumbMaster::new()?;
//! let mut wizard = studio.wizard();
//! // ...drive the wizard to the theme step, then:
//! wizard.generate(&CancelToken::new(), |p| println!("{}%", p.percent())).await?;
//! let zip = studio.exporter().export_all(wizard.results()?, "launch", &CancelToken::new()).await?;
//! ```
//!
//! # Module Structure
//!
//! - [`config`]: Configuration loading from the environment
//! - [`credential`]: API key store and the credential gate seam
//! - [`error`]: Error types and result aliases
//! - [`model`]: Requests, results and layout parameters
//! - [`prompt`]: Prompt construction for generation and refinement
//! - [`ops`]: Cancellation and time limits for long operations
//! - [`fonts`]: Display font discovery for the overlay text

pub mod compositor;
pub mod config;
pub mod credential;
pub mod error;
pub mod export;
pub mod fonts;
pub mod gemini;
pub mod geometry;
pub mod image_processing;
pub mod model;
pub mod ops;
pub mod prompt;
pub mod wizard;

// Re-export primary types for convenience
pub use compositor::Compositor;
pub use config::Config;
pub use credential::{CredentialProvider, CredentialStore, EnvCredential};
pub use error::{AppError, Result};
pub use export::{ExportedFile, Exporter};
pub use gemini::{GeminiClient, ImageSource};
pub use image_processing::ImageData;
pub use model::{
    AccentColor, Emotion, Framing, LayoutParams, SlotId, SlotUpdate, ThumbnailRequest,
    ThumbnailResult,
};
pub use ops::CancelToken;
pub use prompt::RenderOptions;
pub use wizard::{CredentialState, Step, Wizard};

use tracing::info;

/// Main entry point for the studio.
///
/// Owns the configuration, the shared key store and the font database, and
/// hands out the pieces a front end needs.
pub struct ThumbMaster {
    config: Config,
    credentials: CredentialStore,
    compositor: Compositor,
}

impl ThumbMaster {
    /// Loads configuration from the environment (including `.env` files).
    ///
    /// # Errors
    ///
    /// Returns an error if an environment value is present but malformed.
    pub fn new() -> Result<Self> {
        Ok(Self::with_config(Config::load()?))
    }

    /// Creates an instance with custom configuration.
    ///
    /// Font discovery happens here, so this is the expensive constructor.
    pub fn with_config(config: Config) -> Self {
        let credentials = CredentialStore::new(config.gemini_api_key.clone());
        let compositor = Compositor::new(config.font_dir.as_deref());
        info!(
            model = %config.model_name,
            fonts = compositor.font_count(),
            key = credentials.is_set(),
            "studio ready"
        );
        Self {
            config,
            credentials,
            compositor,
        }
    }

    /// The key store shared by every client this instance hands out.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Credential provider backed by the environment key.
    pub fn env_credential(&self) -> EnvCredential {
        EnvCredential::new(self.credentials.clone())
    }

    pub fn gemini(&self) -> GeminiClient {
        let options = RenderOptions {
            size_tier: self.config.image_size.clone(),
            ..RenderOptions::default()
        };
        GeminiClient::new(&self.config, self.credentials.clone()).with_options(options)
    }

    /// A fresh wizard talking to Gemini.
    pub fn wizard(&self) -> Wizard<GeminiClient> {
        Wizard::new(self.gemini(), self.config.request_timeout)
    }

    pub fn exporter(&self) -> Exporter {
        Exporter::new(
            self.compositor.clone(),
            self.config.brand.clone(),
            self.config.decode_timeout,
        )
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Loads `.env` files if present. Call once at startup.
pub fn init() {
    let _ = dotenvy::dotenv();
}

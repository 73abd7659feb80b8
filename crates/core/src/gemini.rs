use crate::config::Config;
use crate::credential::CredentialStore;
use crate::error::{AppError, Result};
use crate::image_processing::ImageData;
use crate::model::{AccentColor, ThumbnailRequest, BATCH_SIZE};
use crate::prompt::{self, RenderOptions};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use gemini_rust::generation::ImageConfig;
use gemini_rust::{Blob, ClientError, Content, ContentBuilder, Gemini, Message, Part, Role};
use tracing::{debug, instrument, warn};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Anything that can produce candidate backgrounds.
///
/// The studio only talks to this trait, so tests and offline runs can swap
/// the paid service for a deterministic source.
#[allow(async_fn_in_trait)]
pub trait ImageSource {
    /// Produces candidate `variation` (0-based, below [`BATCH_SIZE`]) for the request.
    async fn generate(&self, request: &ThumbnailRequest, variation: usize) -> Result<ImageData>;

    /// Produces an improved version of `image` following `suggestion`.
    async fn refine(
        &self,
        image: &ImageData,
        suggestion: &str,
        accent: AccentColor,
    ) -> Result<ImageData>;
}

pub struct GeminiClient {
    credentials: CredentialStore,
    model_url: String,
    options: RenderOptions,
}

impl GeminiClient {
    pub fn new(config: &Config, credentials: CredentialStore) -> Self {
        let model_name = if config.model_name.starts_with("models/") {
            config.model_name.clone()
        } else {
            format!("models/{}", config.model_name)
        };

        Self {
            credentials,
            model_url: format!("{API_BASE}{model_name}"),
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds a client for the key currently in the store.
    fn client(&self) -> Result<Gemini> {
        let api_key = self.credentials.get().ok_or(AppError::CredentialRequired)?;

        // Explicit base URL avoids the BadScheme error of the default builder
        let base_url = url::Url::parse(API_BASE)
            .map_err(|e| AppError::Config(format!("Invalid base URL: {}", e)))?;

        Gemini::with_model_and_base_url(&api_key, self.model_url.clone(), base_url)
            .map_err(|e| AppError::Config(format!("Failed to create Gemini client: {}", e)))
    }

    /// Builds the request for one image and instruction, render options included.
    fn content_request(&self, image: &ImageData, instruction: String) -> Result<ContentBuilder> {
        let client = self.client()?;

        let image_part = Part::InlineData {
            inline_data: Blob {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            },
            media_resolution: None,
        };

        let text_part = Part::Text {
            text: instruction,
            thought: None,
            thought_signature: None,
        };

        let message = Message {
            role: Role::User,
            content: Content {
                role: Some(Role::User),
                parts: Some(vec![image_part, text_part]),
            },
        };

        Ok(client
            .generate_content()
            .with_messages(vec![message])
            .with_image_config(image_config(&self.options)))
    }

    /// Sends an image and an instruction, returns the first image in the reply.
    async fn request_image(&self, image: &ImageData, instruction: String) -> Result<ImageData> {
        let response = self
            .content_request(image, instruction)?
            .execute()
            .await
            .map_err(|e| classify_gemini_error(&e))?;

        let parts = response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.as_ref());

        for part in parts.into_iter().flatten() {
            if let Part::InlineData { inline_data, .. } = part {
                let bytes = BASE64
                    .decode(inline_data.data.as_bytes())
                    .map_err(|e| AppError::gemini(format!("Malformed image payload: {}", e)))?;
                debug!(bytes = bytes.len(), mime = %inline_data.mime_type, "received image");
                return Ok(ImageData::new(inline_data.mime_type.clone(), bytes));
            }
        }

        warn!("Gemini reply contained no image part");
        Err(AppError::gemini("No image received from Gemini"))
    }
}

impl ImageSource for GeminiClient {
    #[instrument(skip(self, request), fields(emotion = %request.emotion, framing = %request.framing))]
    async fn generate(&self, request: &ThumbnailRequest, variation: usize) -> Result<ImageData> {
        if variation >= BATCH_SIZE {
            return Err(AppError::gemini(format!(
                "variation index {variation} is out of range"
            )));
        }
        let instruction = prompt::generation_prompt(request, variation, &self.options)?;
        self.request_image(&request.presenter, instruction).await
    }

    #[instrument(skip(self, image, suggestion))]
    async fn refine(
        &self,
        image: &ImageData,
        suggestion: &str,
        accent: AccentColor,
    ) -> Result<ImageData> {
        let instruction = prompt::refine_prompt(suggestion, accent, &self.options);
        self.request_image(image, instruction).await
    }
}

fn image_config(options: &RenderOptions) -> ImageConfig {
    ImageConfig {
        aspect_ratio: Some(options.aspect_ratio.clone()),
        image_size: Some(options.size_tier.clone()),
    }
}

/// Maps a failed API call to the error class the UI reacts to.
///
/// Only an HTTP error reply can mean quota or credential trouble. Transport,
/// decoding and other client failures are always generic.
fn classify_gemini_error(error: &ClientError) -> AppError {
    match error {
        ClientError::BadResponse { code, description } => {
            classify_api_error(*code, description.as_deref().unwrap_or_default())
        }
        other => AppError::gemini(format!("API request failed: {:?}", other)),
    }
}

/// Classifies an HTTP error reply by status, then by the API status names in
/// its body.
pub fn classify_api_error(status: u16, description: &str) -> AppError {
    const QUOTA: [&str; 2] = ["RESOURCE_EXHAUSTED", "Quota exceeded"];
    const CREDENTIAL: [&str; 4] = [
        "API_KEY_INVALID",
        "API key not valid",
        "PERMISSION_DENIED",
        "UNAUTHENTICATED",
    ];

    let detail = format!("status {status}: {description}");
    match status {
        429 => AppError::QuotaExceeded(detail),
        401 | 403 => AppError::InvalidCredential(detail),
        404 if description.contains("Requested entity was not found") => {
            AppError::InvalidCredential(detail)
        }
        _ if QUOTA.iter().any(|needle| description.contains(needle)) => {
            AppError::QuotaExceeded(detail)
        }
        _ if CREDENTIAL.iter().any(|needle| description.contains(needle)) => {
            AppError::InvalidCredential(detail)
        }
        _ => AppError::gemini(format!("API request failed: {}", detail)),
    }
}

use crate::error::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_BRAND: &str = "thumbmaster";
pub const DEFAULT_IMAGE_SIZE: &str = "1K";
const IMAGE_SIZES: [&str; 3] = ["1K", "2K", "4K"];

#[derive(Clone, Debug)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub model_name: String,
    /// Prefix of every exported file name.
    pub brand: String,
    pub request_timeout: Duration,
    pub decode_timeout: Duration,
    pub font_dir: Option<PathBuf>,
    /// Output size tier requested from the model.
    pub image_size: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());

        let model_name = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let brand = env::var("THUMBMASTER_BRAND").unwrap_or_else(|_| DEFAULT_BRAND.to_string());

        let request_timeout = secs_var("THUMBMASTER_REQUEST_TIMEOUT_SECS", 180)?;
        let decode_timeout = secs_var("THUMBMASTER_DECODE_TIMEOUT_SECS", 30)?;
        let font_dir = env::var("THUMBMASTER_FONT_DIR").ok().map(PathBuf::from);
        let image_size = match env::var("THUMBMASTER_IMAGE_SIZE") {
            Ok(raw) => parse_image_size(&raw)?,
            Err(_) => DEFAULT_IMAGE_SIZE.to_string(),
        };

        Ok(Self {
            gemini_api_key: api_key,
            model_name,
            brand,
            request_timeout,
            decode_timeout,
            font_dir,
            image_size,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model_name: DEFAULT_MODEL.to_string(),
            brand: DEFAULT_BRAND.to_string(),
            request_timeout: Duration::from_secs(180),
            decode_timeout: Duration::from_secs(30),
            font_dir: None,
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
        }
    }
}

fn secs_var(name: &str, default: u64) -> Result<Duration> {
    match env::var(name) {
        Ok(raw) => parse_secs(name, &raw),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::config(format!("{name} must be a whole number of seconds, got '{raw}'")))?;
    if secs == 0 {
        return Err(AppError::config(format!("{name} must be greater than zero")));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_image_size(raw: &str) -> Result<String> {
    let size = raw.trim().to_ascii_uppercase();
    if IMAGE_SIZES.contains(&size.as_str()) {
        Ok(size)
    } else {
        Err(AppError::config(format!(
            "THUMBMASTER_IMAGE_SIZE must be one of {}, got '{raw}'",
            IMAGE_SIZES.join(", ")
        )))
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;

pub const DEFAULT_SETTINGS_FILE: &str = ".cover_letter_settings.json";
pub const DEFAULT_OUTPUT_NAME: &str = "cover_letter.pdf";

// ────────────────────────────────────────────────────────────────────────────
// Process configuration
// ────────────────────────────────────────────────────────────────────────────

/// Configuration read once from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Required for generation; `render` works without it.
    pub openai_api_key: Option<String>,
    /// OpenAI-compatible API root; `None` means api.openai.com.
    pub openai_base_url: Option<String>,
    /// Output filename used when no job description is available.
    pub default_output_name: String,
    pub rust_log: String,
    /// Per-field overrides from `OPENAI_*` variables.
    pub env_overrides: SettingsOverrides,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL"),
            default_output_name: var("COVER_LETTER_OUTPUT")
                .unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string()),
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            env_overrides: SettingsOverrides {
                cover_letter_model: var("OPENAI_MODEL"),
                filename_model: var("OPENAI_FILENAME_MODEL"),
                max_tokens: parse_var(&var, "OPENAI_MAX_TOKENS")?,
                filename_max_tokens: parse_var(&var, "OPENAI_FILENAME_MAX_TOKENS")?,
                temperature: parse_var(&var, "OPENAI_TEMPERATURE")?,
                top_p: parse_var(&var, "OPENAI_TOP_P")?,
                ..SettingsOverrides::default()
            },
        })
    }

    /// Effective settings for one command: the settings file at `path`, then
    /// the `OPENAI_*` environment overrides, then `cli`.
    pub fn settings(&self, path: &Path, cli: &SettingsOverrides) -> Result<Settings, AppError> {
        Settings::resolve(path, &self.env_overrides, cli)
    }

    pub fn require_api_key(&self) -> Result<&str, AppError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("OPENAI_API_KEY environment variable is required".into()))
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a valid number, got '{raw}'"))
        })
        .transpose()
}

// ────────────────────────────────────────────────────────────────────────────
// User settings
// ────────────────────────────────────────────────────────────────────────────

/// User-tunable generation and rendering settings, persisted as JSON.
/// Missing keys keep their defaults; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cover_letter_model: String,
    pub filename_model: String,
    pub max_tokens: u32,
    pub filename_max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub font_name: String,
    pub font_size: f32,
    pub output_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cover_letter_model: "gpt-5.1".to_string(),
            filename_model: "gpt-5.1".to_string(),
            max_tokens: 1200,
            filename_max_tokens: 60,
            temperature: 0.3,
            top_p: 0.95,
            font_name: "Helvetica".to_string(),
            font_size: 12.0,
            output_path: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Reads settings from `path`. A missing file yields defaults; a
    /// malformed one is logged and ignored.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!("Unable to read settings {}: {e}", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("Ignoring malformed settings {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize settings: {e}")))?;
        std::fs::write(path, json).map_err(|source| AppError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rejects values the renderer or the API cannot use.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.font_size > 0.0) {
            return Err(AppError::Config(format!(
                "font_size must be positive, got {}",
                self.font_size
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(AppError::Config(format!(
                "top_p must be in (0, 1], got {}",
                self.top_p
            )));
        }
        if self.max_tokens == 0 || self.filename_max_tokens == 0 {
            return Err(AppError::Config("token limits must be positive".to_string()));
        }
        if self.font_name.trim().is_empty() {
            return Err(AppError::Config("font_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Overlays every field that `overrides` sets.
    pub fn apply(&mut self, overrides: &SettingsOverrides) {
        let o = overrides.clone();
        if let Some(v) = o.cover_letter_model {
            self.cover_letter_model = v;
        }
        if let Some(v) = o.filename_model {
            self.filename_model = v;
        }
        if let Some(v) = o.max_tokens {
            self.max_tokens = v;
        }
        if let Some(v) = o.filename_max_tokens {
            self.filename_max_tokens = v;
        }
        if let Some(v) = o.temperature {
            self.temperature = v;
        }
        if let Some(v) = o.top_p {
            self.top_p = v;
        }
        if let Some(v) = o.font_name {
            self.font_name = v;
        }
        if let Some(v) = o.font_size {
            self.font_size = v;
        }
        if let Some(v) = o.output_path {
            self.output_path = v;
        }
    }

    /// Defaults, then the settings file, then environment, then CLI flags.
    pub fn resolve(
        path: &Path,
        env: &SettingsOverrides,
        cli: &SettingsOverrides,
    ) -> Result<Self, AppError> {
        let mut settings = Self::load(path);
        settings.apply(env);
        settings.apply(cli);
        settings.validate()?;
        Ok(settings)
    }
}

/// A partial `Settings`: only the fields that are `Some` are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub cover_letter_model: Option<String>,
    pub filename_model: Option<String>,
    pub max_tokens: Option<u32>,
    pub filename_max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub font_name: Option<String>,
    pub font_size: Option<f32>,
    pub output_path: Option<PathBuf>,
}

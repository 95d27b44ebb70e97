use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Colour scheme preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = AppSettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(AppSettingsError::InvalidTheme(other.to_string())),
        }
    }
}

pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u32 = 60;
const MIN_AUTOSAVE_INTERVAL_SECS: u32 = 5;
const MAX_AUTOSAVE_INTERVAL_SECS: u32 = 600;

/// Process-wide preferences, loaded once at startup and injected where needed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppSettings {
    theme: Theme,
    sidebar_collapsed: bool,
    autosave_interval_secs: u32,
}

#[derive(Clone, Debug, Default)]
pub struct AppSettingsDraft {
    pub theme: Option<String>,
    pub sidebar_collapsed: Option<bool>,
    pub autosave_interval_secs: Option<u32>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AppSettingsError {
    #[error("invalid theme: {0}")]
    InvalidTheme(String),
    #[error("autosave interval must be between 5 and 600 seconds")]
    InvalidAutosaveInterval,
}

impl AppSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft into persisted settings.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsError` for an unknown theme or an out-of-range interval.
    pub fn validate(self) -> Result<AppSettings, AppSettingsError> {
        let theme = match normalize_optional(self.theme) {
            Some(raw) => raw.parse()?,
            None => Theme::default(),
        };
        let autosave_interval_secs = self
            .autosave_interval_secs
            .unwrap_or(DEFAULT_AUTOSAVE_INTERVAL_SECS);
        if !(MIN_AUTOSAVE_INTERVAL_SECS..=MAX_AUTOSAVE_INTERVAL_SECS)
            .contains(&autosave_interval_secs)
        {
            return Err(AppSettingsError::InvalidAutosaveInterval);
        }

        Ok(AppSettings {
            theme,
            sidebar_collapsed: self.sidebar_collapsed.unwrap_or(false),
            autosave_interval_secs,
        })
    }
}

impl AppSettings {
    /// # Errors
    ///
    /// Returns `AppSettingsError` if persisted values no longer validate.
    pub fn from_persisted(draft: AppSettingsDraft) -> Result<Self, AppSettingsError> {
        draft.validate()
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[must_use]
    pub fn sidebar_collapsed(&self) -> bool {
        self.sidebar_collapsed
    }

    #[must_use]
    pub fn autosave_interval_secs(&self) -> u32 {
        self.autosave_interval_secs
    }

    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            sidebar_collapsed: false,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_ascii_lowercase())
        .filter(|val| !val.is_empty())
}

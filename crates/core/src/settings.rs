//! Generation parameters and the shared settings store.
//!
//! Quality tier and symbol palette are closed sets. Raw user input becomes
//! a [`Quality`] or [`Palette`] through [`FromStr`], which trims and
//! lower-cases before matching, so every stored value is already in its
//! normalized form.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Valid quality tier values, in ascending order.
pub const VALID_QUALITIES: &[&str] = &["low", "medium", "high"];

/// Valid symbol palette values.
pub const VALID_PALETTES: &[&str] = &["math", "ascii", "greek"];

/// Trim surrounding whitespace and lower-case a raw option value.
pub fn normalize_option(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Quality
// ---------------------------------------------------------------------------

/// Upscaling tier requested from the conversion service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Low,
    Medium,
    High,
}

impl Quality {
    /// Wire representation sent in the `quality` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Quality {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_option(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(CoreError::Validation(format!(
                "Invalid quality '{other}'. Must be one of: {VALID_QUALITIES:?}"
            ))),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Glyph family the service draws the artwork with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    #[default]
    Math,
    Ascii,
    Greek,
}

impl Palette {
    /// Wire representation sent in the `palette` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Ascii => "ascii",
            Self::Greek => "greek",
        }
    }
}

impl FromStr for Palette {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_option(s).as_str() {
            "math" => Ok(Self::Math),
            "ascii" => Ok(Self::Ascii),
            "greek" => Ok(Self::Greek),
            other => Err(CoreError::Validation(format!(
                "Invalid palette '{other}'. Must be one of: {VALID_PALETTES:?}"
            ))),
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GenerationSettings
// ---------------------------------------------------------------------------

/// The two parameters sent alongside every conversion request.
///
/// `Copy`, so a request takes its own snapshot rather than a reference
/// into the live store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub quality: Quality,
    pub palette: Palette,
}

// ---------------------------------------------------------------------------
// SettingsStore
// ---------------------------------------------------------------------------

/// Session-wide holder of the current [`GenerationSettings`].
///
/// Clones share the same underlying value, so the UI side and the
/// workflow observe each other's writes immediately.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    inner: Arc<RwLock<GenerationSettings>>,
}

impl SettingsStore {
    /// Create a store holding the session defaults (`low`, `math`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with explicit settings.
    pub fn with_settings(settings: GenerationSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the latest settings.
    pub fn snapshot(&self) -> GenerationSettings {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_quality(&self, quality: Quality) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .quality = quality;
    }

    pub fn set_palette(&self, palette: Palette) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .palette = palette;
    }

    /// Restore the session defaults.
    pub fn reset(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) =
            GenerationSettings::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

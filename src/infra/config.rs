// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Budgets and thresholds for the document extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Wall-clock budget for a whole document, in seconds. Exceeding it
    /// truncates the output, it does not fail the request.
    pub max_seconds: u64,
    /// Output size budget in characters.
    pub max_chars: usize,
    /// Minimum normalized length for a page's text layer to count as
    /// meaningful on its own.
    pub min_page_chars: usize,
    /// Minimum fraction of alphabetic characters for meaningful text.
    /// Loosened so data tables and part lists don't trigger OCR.
    pub min_letter_ratio: f64,
    /// Direct-extraction length below which a page is considered textless
    /// and worth rasterizing.
    pub ocr_floor_chars: usize,
    /// Minimum normalized OCR output length to prefer it over the text layer.
    pub ocr_min_chars: usize,
    /// Whether OCR fallback is attempted at all.
    pub ocr_enabled: bool,
    /// Rasterization resolution handed to the OCR collaborator.
    pub ocr_dpi: u32,
    /// Combined language hint tried first.
    pub ocr_languages: String,
    /// Single language retried when the combined model fails.
    pub ocr_fallback_language: String,
    /// Caller-side deadline for one extraction request, independent of
    /// `max_seconds`.
    pub request_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_seconds: 60,
            max_chars: 120_000,
            min_page_chars: 150,
            min_letter_ratio: 0.20,
            ocr_floor_chars: 50,
            ocr_min_chars: 30,
            ocr_enabled: true,
            ocr_dpi: 200,
            ocr_languages: "tur+eng".into(),
            ocr_fallback_language: "eng".into(),
            request_timeout_secs: 120,
        }
    }
}

/// Session persistence knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds within which an identical (sender, content) append is treated
    /// as a double submission and suppressed.
    pub dedup_window_secs: i64,
    /// Most recent product mentions retained per session.
    pub mention_cap: usize,
    /// Live SessionStore instances kept in the cache.
    pub cache_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dedup_window_secs: 5,
            mention_cap: 5,
            cache_capacity: 10,
        }
    }
}

/// Where the product catalog and manual files live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Products database path; defaults to `paths::catalog_db_path()`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_db: Option<PathBuf>,
    /// Root directory that relative `manual_path` values resolve against;
    /// defaults to `paths::manuals_dir()`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manuals_root: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn products_db_path(&self) -> PathBuf {
        self.products_db
            .clone()
            .unwrap_or_else(paths::catalog_db_path)
    }

    pub fn manuals_root_path(&self) -> PathBuf {
        self.manuals_root.clone().unwrap_or_else(paths::manuals_dir)
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

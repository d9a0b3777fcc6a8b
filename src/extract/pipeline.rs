// src/extract/pipeline.rs — Whole-document extraction under budgets
//
// Drives the page extractor across a document, bounded by a wall-clock and
// an output-size budget. Budget exhaustion is a reported truncation, never
// an error; only an undecryptable document fails the request.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::extract::page::{extract_page, OcrEngine, PageOptions, PageSource};
use crate::extract::pdf::PdfPages;
use crate::infra::config::ExtractionConfig;
use crate::infra::errors::AftersalesError;

/// Stand-in for pages that yielded no text; the banner stays so document
/// structure remains inspectable.
pub const EMPTY_PAGE_PLACEHOLDER: &str = "[no text could be recovered from this page]";

/// Why extraction stopped before the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// Wall-clock budget hit; `last_page` is the 1-based number of the last
    /// page processed (0 when none were).
    Time { last_page: usize },
    /// Character budget hit after `last_page`.
    Size { last_page: usize },
}

/// Extracted text for one page, tagged with its provenance.
#[derive(Debug, Clone)]
pub struct PageBlock {
    /// 1-based page number.
    pub page: usize,
    pub text: String,
    pub used_ocr: bool,
    pub failed: bool,
}

/// The result of one extraction request. Built fresh every time; callers
/// cache rendered output themselves if they want to.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub source: String,
    pub total_pages: usize,
    pub pages: Vec<PageBlock>,
    pub truncation: Option<Truncation>,
}

impl ExtractedDocument {
    pub fn pages_processed(&self) -> usize {
        self.pages.len()
    }

    pub fn any_ocr(&self) -> bool {
        self.pages.iter().any(|p| p.used_ocr)
    }

    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncation.is_some()
    }

    /// Render the page-delimited document body with its header and any
    /// truncation notice. Empty pages keep their banner.
    pub fn render(&self) -> String {
        let mut out = format!(
            "=== {} | pages: {}/{} | ocr: {} ===\n",
            self.source,
            self.pages_processed(),
            self.total_pages,
            if self.any_ocr() { "yes" } else { "no" },
        );

        for block in &self.pages {
            out.push_str(&format!("\n--- Page {}/{} ---\n", block.page, self.total_pages));
            if block.text.is_empty() {
                out.push_str(EMPTY_PAGE_PLACEHOLDER);
            } else {
                out.push_str(&block.text);
            }
            out.push('\n');
        }

        match self.truncation {
            Some(Truncation::Time { last_page }) => {
                out.push_str(&format!(
                    "\n[stopped at page {}/{}: time budget exceeded]\n",
                    last_page, self.total_pages
                ));
            }
            Some(Truncation::Size { last_page }) => {
                out.push_str(&format!(
                    "\n[stopped at page {}/{}: size budget exceeded]\n",
                    last_page, self.total_pages
                ));
            }
            None => {}
        }

        out
    }
}

/// The document extraction pipeline. Cheap to clone; the OCR engine, when
/// configured, is shared.
#[derive(Clone)]
pub struct Pipeline {
    cfg: ExtractionConfig,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl Pipeline {
    pub fn new(cfg: ExtractionConfig) -> Self {
        Self { cfg, ocr: None }
    }

    pub fn with_ocr(cfg: ExtractionConfig, engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            cfg,
            ocr: Some(engine),
        }
    }

    fn page_options(&self) -> PageOptions<'_> {
        PageOptions {
            min_chars: self.cfg.min_page_chars,
            min_letter_ratio: self.cfg.min_letter_ratio,
            ocr_floor_chars: self.cfg.ocr_floor_chars,
            ocr_min_chars: self.cfg.ocr_min_chars,
            dpi: self.cfg.ocr_dpi,
            languages: &self.cfg.ocr_languages,
            fallback_language: &self.cfg.ocr_fallback_language,
        }
    }

    /// Run the page extractor over every page of `source`, stopping early
    /// when a budget runs out. A zero-page source yields a header and empty
    /// body, not an error.
    pub fn extract(&self, source: &dyn PageSource, name: &str) -> ExtractedDocument {
        let start = Instant::now();
        let time_budget = Duration::from_secs(self.cfg.max_seconds);
        let total_pages = source.page_count();
        let opts = self.page_options();
        let ocr = if self.cfg.ocr_enabled {
            self.ocr.as_deref()
        } else {
            None
        };

        let mut pages = Vec::new();
        let mut truncation = None;
        let mut chars = 0usize;

        for index in 0..total_pages {
            if start.elapsed() > time_budget {
                warn!(
                    source = name,
                    processed = pages.len(),
                    total = total_pages,
                    "time budget exceeded, truncating document"
                );
                truncation = Some(Truncation::Time {
                    last_page: pages.len(),
                });
                break;
            }

            let extraction = extract_page(source, index, ocr, &opts);
            chars += extraction.text.chars().count();
            pages.push(PageBlock {
                page: index + 1,
                text: extraction.text,
                used_ocr: extraction.used_ocr,
                failed: extraction.failed,
            });

            if chars > self.cfg.max_chars {
                warn!(
                    source = name,
                    chars,
                    budget = self.cfg.max_chars,
                    "size budget exceeded, truncating document"
                );
                truncation = Some(Truncation::Size {
                    last_page: index + 1,
                });
                break;
            }
        }

        debug!(
            source = name,
            pages = pages.len(),
            total = total_pages,
            chars,
            truncated = truncation.is_some(),
            "document extraction complete"
        );

        ExtractedDocument {
            source: name.to_string(),
            total_pages,
            pages,
            truncation,
        }
    }

    /// Open a PDF from disk and extract it. Encryption that an empty
    /// password cannot clear is fatal for this request only.
    pub fn extract_path(&self, path: &Path) -> Result<ExtractedDocument, AftersalesError> {
        let pdf = PdfPages::open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(self.extract(&pdf, &name))
    }

    /// Extraction off the request path: runs on the blocking pool under a
    /// caller-side deadline independent of the pipeline's internal budget.
    /// A timeout is a recoverable "try again" outcome.
    pub async fn extract_path_timed(
        &self,
        path: &Path,
    ) -> Result<ExtractedDocument, AftersalesError> {
        let pipeline = self.clone();
        let path_buf = path.to_path_buf();
        let deadline = Duration::from_secs(self.cfg.request_timeout_secs);

        let task = tokio::task::spawn_blocking(move || pipeline.extract_path(&path_buf));
        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(AftersalesError::Other(anyhow::anyhow!(
                "extraction task failed: {join_err}"
            ))),
            Err(_) => Err(AftersalesError::ExtractionTimeout {
                path: path.display().to_string(),
                timeout_secs: self.cfg.request_timeout_secs,
            }),
        }
    }
}

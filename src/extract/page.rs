// src/extract/page.rs — Per-page hybrid text acquisition
//
// Direct text-layer extraction first; rasterize + OCR only when the page is
// essentially textless. OCR is an external collaborator behind the OcrEngine
// trait, invoked with a rasterized page and a language hint.

use tracing::debug;

use crate::extract::normalize::{is_meaningful, normalize};

/// A single page rasterized for the OCR collaborator.
pub struct PageImage {
    pub data: Vec<u8>,
    pub dpi: u32,
}

/// Page-level access to a document. Implemented by the lopdf-backed
/// `PdfPages` and by in-memory fakes in tests.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Direct text-layer extraction for a zero-based page index.
    fn text(&self, index: usize) -> anyhow::Result<String>;

    /// Rasterize one page for OCR. Sources without a renderer return an
    /// error, which degrades per the usual page failure semantics.
    fn rasterize(&self, index: usize, dpi: u32) -> anyhow::Result<PageImage>;
}

/// External OCR capability: one rasterized page in, plain text out.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &PageImage, languages: &str) -> anyhow::Result<String>;
}

/// Outcome for one page. Faults never propagate out of page extraction;
/// `failed` records that an attempt errored and the output degraded.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub text: String,
    pub used_ocr: bool,
    pub failed: bool,
}

/// Thresholds controlling the text-layer/OCR decision for one page.
#[derive(Debug, Clone, Copy)]
pub struct PageOptions<'a> {
    /// Minimum normalized length for the text layer to stand on its own.
    pub min_chars: usize,
    pub min_letter_ratio: f64,
    /// Below this the page counts as textless rather than terse.
    pub ocr_floor_chars: usize,
    /// OCR output at or below this is considered noise.
    pub ocr_min_chars: usize,
    pub dpi: u32,
    pub languages: &'a str,
    pub fallback_language: &'a str,
}

/// Extract one page, preferring the text layer and falling back to OCR only
/// when the layer is essentially absent. Never errors and never drops a
/// page: the worst outcome is empty text.
pub fn extract_page(
    source: &dyn PageSource,
    index: usize,
    ocr: Option<&dyn OcrEngine>,
    opts: &PageOptions<'_>,
) -> PageExtraction {
    let (direct, direct_failed) = match source.text(index) {
        Ok(raw) => (normalize(&raw), false),
        Err(e) => {
            debug!(page = index, error = %e, "text layer extraction failed");
            (String::new(), true)
        }
    };

    if is_meaningful(&direct, opts.min_chars, opts.min_letter_ratio) {
        return PageExtraction {
            text: direct,
            used_ocr: false,
            failed: false,
        };
    }

    // OCR is expensive: only rasterize when the text layer is essentially
    // absent, not merely sparse.
    let mut ocr_failed = false;
    if let Some(engine) = ocr {
        if direct.chars().count() < opts.ocr_floor_chars {
            match run_ocr(source, index, engine, opts) {
                Ok(recognized) => {
                    let recognized = normalize(&recognized);
                    if recognized.chars().count() > opts.ocr_min_chars {
                        return PageExtraction {
                            text: recognized,
                            used_ocr: true,
                            failed: false,
                        };
                    }
                    debug!(page = index, "ocr output too short, keeping text layer");
                }
                Err(e) => {
                    debug!(page = index, error = %e, "ocr failed, keeping text layer");
                    ocr_failed = true;
                }
            }
        }
    }

    PageExtraction {
        text: direct,
        used_ocr: false,
        failed: direct_failed || ocr_failed,
    }
}

/// Rasterize and recognize: combined language model first, single default
/// language on failure.
fn run_ocr(
    source: &dyn PageSource,
    index: usize,
    engine: &dyn OcrEngine,
    opts: &PageOptions<'_>,
) -> anyhow::Result<String> {
    let image = source.rasterize(index, opts.dpi)?;
    match engine.recognize(&image, opts.languages) {
        Ok(text) => Ok(text),
        Err(e) => {
            debug!(
                page = index,
                languages = opts.languages,
                error = %e,
                "combined language model failed, retrying with default"
            );
            engine.recognize(&image, opts.fallback_language)
        }
    }
}

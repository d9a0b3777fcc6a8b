// src/extract/pdf.rs — lopdf-backed page source

use lopdf::Document;
use std::path::Path;
use tracing::debug;

use crate::extract::page::{PageImage, PageSource};
use crate::infra::errors::AftersalesError;

/// A loaded PDF exposing per-page text extraction.
///
/// Rasterization is not provided here: rendering pages to images is the job
/// of an external renderer wired in by the deployment, and its absence simply
/// means OCR degrades to the text layer.
pub struct PdfPages {
    doc: Document,
    page_numbers: Vec<u32>,
    path: String,
}

impl PdfPages {
    /// Load a document; encrypted files get one empty-password decrypt
    /// attempt and are otherwise a hard failure for this request.
    pub fn open(path: &Path) -> Result<Self, AftersalesError> {
        let path_str = path.display().to_string();
        let mut doc = Document::load(path).map_err(|e| AftersalesError::DocumentOpen {
            path: path_str.clone(),
            message: e.to_string(),
        })?;

        if doc.is_encrypted() {
            debug!(path = %path_str, "document is encrypted, attempting empty password");
            doc.decrypt("")
                .map_err(|_| AftersalesError::EncryptedDocument {
                    path: path_str.clone(),
                })?;
        }

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        Ok(Self {
            doc,
            page_numbers,
            path: path_str,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl PageSource for PdfPages {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn text(&self, index: usize) -> anyhow::Result<String> {
        let page_number = *self
            .page_numbers
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("page index {index} out of range"))?;
        let text = self.doc.extract_text(&[page_number])?;
        Ok(text)
    }

    fn rasterize(&self, index: usize, _dpi: u32) -> anyhow::Result<PageImage> {
        anyhow::bail!(
            "no page renderer available for '{}' page {}",
            self.path,
            index
        )
    }
}

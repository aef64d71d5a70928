use std::cell::OnceCell;

use log::debug;
use thiserror::Error;

use parser::backend::{LopdfBackend, PageId, PdfBackend};
use parser::content::{scan_page, PageScan};
use pdftables_core::{
    extract_document, ExtractionResult, ExtractorConfig, PageGeometryProvider, ProviderError,
    RuledRegion, Token,
};

pub mod parser;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A loaded PDF that serves page geometry to the table extractors.
///
/// Each page's content stream is walked at most once; tokens and ruled
/// regions are both derived from the cached scan.
pub struct PdfDocument {
    backend: LopdfBackend,
    pages: Vec<PageId>,
    scans: Vec<OnceCell<Result<PageScan, ProviderError>>>,
}

impl PdfDocument {
    /// Parse PDF bytes. Fails for unreadable or encrypted documents.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let backend = LopdfBackend::load_bytes(bytes)?;
        let pages: Vec<PageId> = backend.pages().into_values().collect();
        debug!("Loaded PDF with {} page(s)", pages.len());
        let scans = pages.iter().map(|_| OnceCell::new()).collect();
        Ok(Self {
            backend,
            pages,
            scans,
        })
    }

    /// Read and parse a PDF from disk.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    fn scan(&self, page: usize) -> Result<&PageScan, ProviderError> {
        let idx = page
            .checked_sub(1)
            .filter(|idx| *idx < self.pages.len())
            .ok_or(ProviderError::PageOutOfRange(page))?;

        self.scans[idx]
            .get_or_init(|| {
                scan_page(&self.backend, self.pages[idx], page).map_err(|e| {
                    ProviderError::Decode {
                        page,
                        reason: e.to_string(),
                    }
                })
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl PageGeometryProvider for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn tokens(&self, page: usize) -> Result<Vec<Token>, ProviderError> {
        let scan = self.scan(page)?;
        if scan.is_image_only() {
            return Err(ProviderError::Unsupported {
                page,
                reason: "image-only page".to_string(),
            });
        }
        Ok(scan.tokens.clone())
    }

    fn ruled_regions(&self, page: usize) -> Result<Vec<RuledRegion>, ProviderError> {
        let scan = self.scan(page)?;
        let regions = parser::rules::find_ruled_regions(&scan.segments);
        debug!(
            "Page {page}: {} segment(s), {} ruled region(s)",
            scan.segments.len(),
            regions.len()
        );
        Ok(regions)
    }
}

// ---------------------------------------------------------------------------
// Convenience free functions
// ---------------------------------------------------------------------------

/// Parse PDF bytes and extract every table.
pub fn extract_tables(
    bytes: &[u8],
    config: &ExtractorConfig,
) -> Result<ExtractionResult, PdfError> {
    let document = PdfDocument::from_bytes(bytes)?;
    Ok(extract_document(&document, config))
}

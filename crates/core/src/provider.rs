//! The seam between the pure extractors and whatever reads the PDF.

use thiserror::Error;

use crate::types::{RuledRegion, Token};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Page {0} does not exist")]
    PageOutOfRange(usize),
    #[error("Failed to decode page {page}: {reason}")]
    Decode { page: usize, reason: String },
    #[error("Unsupported content on page {page}: {reason}")]
    Unsupported { page: usize, reason: String },
}

/// Supplies positioned text and ruled-line grids for each page of a document.
///
/// Pages are 1-based. An implementation may fail on any page without
/// poisoning the others.
pub trait PageGeometryProvider {
    fn page_count(&self) -> usize;

    fn tokens(&self, page: usize) -> Result<Vec<Token>, ProviderError>;

    fn ruled_regions(&self, page: usize) -> Result<Vec<RuledRegion>, ProviderError>;
}

/// Everything the extractors need to know about one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageGeometry {
    pub tokens: Vec<Token>,
    pub regions: Vec<RuledRegion>,
}

impl PageGeometry {
    pub fn load<P: PageGeometryProvider + ?Sized>(
        provider: &P,
        page: usize,
    ) -> Result<Self, ProviderError> {
        Ok(PageGeometry {
            tokens: provider.tokens(page)?,
            regions: provider.ruled_regions(page)?,
        })
    }
}

/// Provider backed by pre-built pages. Useful for fixtures and for callers
/// that already hold the geometry.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    pages: Vec<Result<PageGeometry, ProviderError>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: PageGeometry) -> Self {
        self.pages.push(Ok(page));
        self
    }

    /// Append a page that fails to load with `error`.
    pub fn with_failing_page(mut self, error: ProviderError) -> Self {
        self.pages.push(Err(error));
        self
    }

    fn page(&self, page: usize) -> Result<&PageGeometry, ProviderError> {
        let slot = page
            .checked_sub(1)
            .and_then(|idx| self.pages.get(idx))
            .ok_or(ProviderError::PageOutOfRange(page))?;
        slot.as_ref().map_err(Clone::clone)
    }
}

impl PageGeometryProvider for MemoryProvider {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn tokens(&self, page: usize) -> Result<Vec<Token>, ProviderError> {
        Ok(self.page(page)?.tokens.clone())
    }

    fn ruled_regions(&self, page: usize) -> Result<Vec<RuledRegion>, ProviderError> {
        Ok(self.page(page)?.regions.clone())
    }
}

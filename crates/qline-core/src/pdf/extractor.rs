//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, warn};

use super::{PdfProcessor, PdfType, Result};
use crate::error::PdfError;
use crate::quote::rules::cid_ratio;

/// PDF text extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    cid_threshold: f32,
    min_text_length: usize,
}

/// Extracted content from a PDF.
#[derive(Debug, Clone)]
pub struct PdfContent {
    /// Quality of the text layer.
    pub pdf_type: PdfType,
    /// Text of all pages, separated by page markers.
    pub text: String,
    /// Pages with their content.
    pub pages: Vec<PdfPage>,
}

/// Content from a single PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text from this page.
    pub text: String,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            cid_threshold: 0.05,
            min_text_length: 50,
        }
    }

    /// Ratio of `cid:` artifacts above which text counts as degraded.
    pub fn with_cid_threshold(mut self, threshold: f32) -> Self {
        self.cid_threshold = threshold;
        self
    }

    /// Shortest text still treated as a usable text layer.
    pub fn with_min_text_length(mut self, length: usize) -> Self {
        self.min_text_length = length;
        self
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    fn classify(&self, text: &str) -> PdfType {
        if text.trim().chars().count() < self.min_text_length {
            PdfType::Empty
        } else if cid_ratio(text) > self.cid_threshold {
            PdfType::Degraded
        } else {
            PdfType::Text
        }
    }

    /// Text of every page, each preceded by an `=== PAGE n ===` marker.
    ///
    /// A page that fails to extract contributes an empty page.
    pub fn extract_marked_text(&self) -> Result<String> {
        let pages = self.pages()?;
        let mut text = String::new();
        for page in &pages {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&format!("=== PAGE {} ===\n", page.number));
            text.push_str(&page.text);
        }
        Ok(text)
    }

    fn pages(&self) -> Result<Vec<PdfPage>> {
        let page_count = self.document()?.get_pages().len() as u32;
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        let pages = (1..=page_count)
            .map(|number| {
                let text = self.extract_page_text(number).unwrap_or_else(|e| {
                    warn!("Page {} text extraction failed: {}", number, e);
                    String::new()
                });
                PdfPage { number, text }
            })
            .collect();
        Ok(pages)
    }

    /// Load and extract all content from a PDF.
    pub fn extract_all(&self) -> Result<PdfContent> {
        let pages = self.pages()?;
        let text = self.extract_marked_text()?;

        let page_text: String = pages.iter().map(|p| p.text.as_str()).collect();
        let pdf_type = self.classify(&page_text);

        debug!(
            "PDF analysis: {} pages, {} chars text -> {:?}",
            pages.len(),
            page_text.len(),
            pdf_type
        );

        Ok(PdfContent {
            pdf_type,
            text,
            pages,
        })
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf_extract reads the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn analyze(&self) -> PdfType {
        let text = self.extract_text().unwrap_or_default();
        let pdf_type = self.classify(&text);
        debug!("PDF analysis: {} chars -> {:?}", text.len(), pdf_type);
        pdf_type
    }

    /// Whole-document text from pdf-extract, falling back to lopdf page by
    /// page when pdf-extract fails.
    fn extract_text(&self) -> Result<String> {
        self.document()?;
        match pdf_extract::extract_text_from_mem(&self.raw_data) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("pdf-extract failed ({}), falling back to lopdf", e);
                let pages = self.pages()?;
                Ok(pages
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if !doc.get_pages().contains_key(&page) {
            return Err(PdfError::InvalidPage(page));
        }
        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

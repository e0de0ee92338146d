//! Text sources and the scored fallback chain over them.
//!
//! A chain tries each source in order, parses whatever text it yields and
//! keeps the best-scoring result. Sources that fail are recorded and
//! skipped; only a chain where every source fails is an error.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::{ExtractionError, Result};

use super::parser::{score_result, ExtractionReport, LineItemParser};

/// Something that can produce page text for the parser.
pub trait TextSource {
    /// Name used in logs and chain reports.
    fn name(&self) -> &str;

    /// Produce the text.
    fn acquire(&self) -> Result<String>;
}

/// Text that is already in memory, e.g. produced by an external OCR step.
#[derive(Debug, Clone)]
pub struct RawText {
    name: String,
    text: String,
}

impl RawText {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl TextSource for RawText {
    fn name(&self) -> &str {
        &self.name
    }

    fn acquire(&self) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// A UTF-8 text file on disk.
#[derive(Debug, Clone)]
pub struct TextFile {
    name: String,
    path: PathBuf,
}

impl TextFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("text:{}", path.display()),
            path,
        }
    }
}

impl TextSource for TextFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn acquire(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

#[cfg(feature = "pdf")]
pub use pdf_source::PdfText;

#[cfg(feature = "pdf")]
mod pdf_source {
    use std::path::PathBuf;

    use crate::error::Result;
    use crate::models::config::PdfConfig;
    use crate::pdf::{PdfExtractor, PdfProcessor};

    use super::TextSource;

    #[derive(Debug, Clone)]
    enum PdfInput {
        Bytes(Vec<u8>),
        Path(PathBuf),
    }

    /// Text layer of a PDF document.
    #[derive(Debug, Clone)]
    pub struct PdfText {
        name: String,
        input: PdfInput,
        config: PdfConfig,
    }

    impl PdfText {
        pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
            Self {
                name: name.into(),
                input: PdfInput::Bytes(data),
                config: PdfConfig::default(),
            }
        }

        pub fn from_path(path: impl Into<PathBuf>) -> Self {
            let path = path.into();
            Self {
                name: format!("pdf:{}", path.display()),
                input: PdfInput::Path(path),
                config: PdfConfig::default(),
            }
        }

        pub fn with_config(mut self, config: PdfConfig) -> Self {
            self.config = config;
            self
        }
    }

    impl TextSource for PdfText {
        fn name(&self) -> &str {
            &self.name
        }

        fn acquire(&self) -> Result<String> {
            let data = match &self.input {
                PdfInput::Bytes(data) => data.clone(),
                PdfInput::Path(path) => std::fs::read(path)?,
            };

            let mut extractor = PdfExtractor::new()
                .with_cid_threshold(self.config.cid_ratio_threshold)
                .with_min_text_length(self.config.min_text_length);
            extractor.load(&data)?;

            let text = if self.config.page_markers {
                extractor.extract_marked_text()?
            } else {
                extractor.extract_text()?
            };
            Ok(text)
        }
    }
}

/// How a single chain source fared.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// No text: the reason.
    Failed(String),
    /// Parsed with this quality score.
    Scored(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainAttempt {
    pub source: String,
    pub outcome: AttemptOutcome,
}

/// Best result of a chain run.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    /// Name of the source the result came from.
    pub source: String,
    pub score: f32,
    pub report: ExtractionReport,
    /// Every source tried, in order.
    pub attempts: Vec<ChainAttempt>,
}

/// Ordered fallback over text sources.
pub struct SourceChain<'a> {
    parser: &'a LineItemParser,
    sources: Vec<Box<dyn TextSource + 'a>>,
    accept_score: f32,
}

impl<'a> SourceChain<'a> {
    pub fn new(parser: &'a LineItemParser) -> Self {
        Self {
            parser,
            sources: Vec::new(),
            accept_score: 70.0,
        }
    }

    pub fn with_source(mut self, source: impl TextSource + 'a) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Score at which the chain stops trying further sources.
    pub fn with_accept_score(mut self, score: f32) -> Self {
        self.accept_score = score;
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Run the chain. Ties keep the earlier source.
    pub fn run(&self) -> Result<ChainOutcome> {
        let mut attempts = Vec::with_capacity(self.sources.len());
        let mut best: Option<(String, f32, ExtractionReport)> = None;

        for source in &self.sources {
            let name = source.name().to_string();

            let text = match source.acquire() {
                Ok(text) if text.trim().is_empty() => {
                    let reason = ExtractionError::EmptyText.to_string();
                    warn!("Source {} failed: {}", name, reason);
                    attempts.push(ChainAttempt {
                        source: name,
                        outcome: AttemptOutcome::Failed(reason),
                    });
                    continue;
                }
                Ok(text) => text,
                Err(e) => {
                    warn!("Source {} failed: {}", name, e);
                    attempts.push(ChainAttempt {
                        source: name,
                        outcome: AttemptOutcome::Failed(e.to_string()),
                    });
                    continue;
                }
            };

            let report = self.parser.parse_detailed(&text);
            let score = score_result(&report);
            debug!("Source {} scored {:.1}", name, score);
            attempts.push(ChainAttempt {
                source: name.clone(),
                outcome: AttemptOutcome::Scored(score),
            });

            if best.as_ref().is_none_or(|(_, s, _)| score > *s) {
                best = Some((name, score, report));
            }
            if score >= self.accept_score {
                break;
            }
        }

        let (source, score, mut report) = best.ok_or(ExtractionError::NoUsableSource)?;

        for attempt in &attempts {
            if let AttemptOutcome::Failed(reason) = &attempt.outcome {
                let failure = ExtractionError::Source {
                    name: attempt.source.clone(),
                    reason: reason.clone(),
                };
                report.warnings.push(failure.to_string());
            }
        }

        info!("Chain picked {} with score {:.1}", source, score);
        Ok(ChainOutcome {
            source,
            score,
            report,
            attempts,
        })
    }
}

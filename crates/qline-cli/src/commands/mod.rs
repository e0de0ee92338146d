//! Subcommands and the pieces they share.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use qline_core::quote::{PdfText, TextFile};
use qline_core::{QlineConfig, TextSource};

/// Load the config given with `--config`, else the user config file if it
/// exists, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<QlineConfig> {
    let default_path = config::default_config_path();
    let config = match config_path {
        Some(path) => QlineConfig::from_file(Path::new(path))?,
        None if default_path.exists() => QlineConfig::from_file(&default_path)?,
        None => QlineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Input kinds the CLI knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Text,
}

impl InputKind {
    pub fn of(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Primary text source for a file of the given kind.
pub fn primary_source(path: &Path, kind: InputKind, config: &QlineConfig) -> PrimarySource {
    match kind {
        InputKind::Pdf => {
            PrimarySource::Pdf(PdfText::from_path(path).with_config(config.pdf.clone()))
        }
        InputKind::Text => PrimarySource::Text(TextFile::new(PathBuf::from(path))),
    }
}

/// Either of the file-backed sources, so callers can add it to a chain.
pub enum PrimarySource {
    Pdf(PdfText),
    Text(TextFile),
}

impl TextSource for PrimarySource {
    fn name(&self) -> &str {
        match self {
            Self::Pdf(source) => source.name(),
            Self::Text(source) => source.name(),
        }
    }

    fn acquire(&self) -> qline_core::Result<String> {
        match self {
            Self::Pdf(source) => source.acquire(),
            Self::Text(source) => source.acquire(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind() {
        assert_eq!(InputKind::of(Path::new("quote.PDF")), Some(InputKind::Pdf));
        assert_eq!(InputKind::of(Path::new("ocr/page.txt")), Some(InputKind::Text));
        assert_eq!(InputKind::of(Path::new("scan.png")), None);
        assert_eq!(InputKind::of(Path::new("README")), None);
    }
}

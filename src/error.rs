//! Error types for deckfill operations.

use thiserror::Error;

/// Errors that can occur while loading, filling, or analyzing a template.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Corrupt template: {0}")]
    TemplateCorrupt(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(#[source] Box<Error>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Wrap an error raised while substituting or serializing.
    ///
    /// Errors that are already `GenerationFailed` are passed through as-is.
    pub(crate) fn generation(cause: Error) -> Self {
        match cause {
            Error::GenerationFailed(_) => cause,
            other => Error::GenerationFailed(Box::new(other)),
        }
    }

    /// Returns true for the two load failures (`TemplateNotFound`, `TemplateCorrupt`).
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Error::TemplateNotFound(_) | Error::TemplateCorrupt(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

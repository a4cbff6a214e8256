use miette::Diagnostic;
use thiserror::Error;

/// Main error type for tailor operations
#[derive(Error, Diagnostic, Debug)]
pub enum TailorError {
    #[error("IO error: {0}")]
    #[diagnostic(code(tailor::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(tailor::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Missing {what}: {path}")]
    #[diagnostic(code(tailor::missing_input))]
    MissingInput {
        what: &'static str,
        path: std::path::PathBuf,
    },

    #[error("Image error with {path}: {message}")]
    #[diagnostic(code(tailor::image))]
    Image {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(tailor::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Config error: {message}")]
    #[diagnostic(code(tailor::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Validation error: {message}")]
    #[diagnostic(code(tailor::validate))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Pipeline error: {message}")]
    #[diagnostic(code(tailor::pipeline))]
    Pipeline {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl TailorError {
    /// True for errors caused by an input file or directory that does not exist.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, TailorError::MissingInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, TailorError>;

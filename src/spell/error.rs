use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SpellError {
    /// No dictionary could be loaded for the requested language.
    #[error("no dictionary available for language: {0}")]
    Backend(String),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dictionary for {tag}: {message}")]
    Parse { tag: String, message: String },
}

impl SpellError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

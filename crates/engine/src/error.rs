use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A host primitive (read, write, rename, exists, list) failed.
    #[error("{op} {path}: {message}")]
    HostError {
        op: &'static str,
        path: String,
        message: String,
    },

    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn host(op: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostError {
            op,
            path: path.into(),
            message: message.into(),
        }
    }
}

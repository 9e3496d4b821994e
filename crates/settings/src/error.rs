use thiserror::Error;

/// Result type for settings operations
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors that can occur while loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Settings blob was not valid JSON
    #[error("Invalid settings JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Settings file was not valid TOML
    #[error("Invalid settings TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Settings could not be rendered as TOML
    #[error("Cannot serialize settings: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CapError>;

#[derive(Error, Debug)]
pub enum CapError {
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CapError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OracleError>;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} reported an error: {diagnostic}")]
    ToolFailed { program: String, diagnostic: String },

    #[error("Unexpected output from {program}: {output:?}")]
    UnexpectedOutput { program: String, output: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OracleError {
    /// Text suitable for surfacing to an operator: the tool's own diagnostic when
    /// there is one, the rendered error otherwise.
    pub fn diagnostic(&self) -> String {
        match self {
            OracleError::ToolFailed { diagnostic, .. } => diagnostic.clone(),
            other => other.to_string(),
        }
    }
}

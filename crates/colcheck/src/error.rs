use crate::compare::MismatchReport;
use std::path::PathBuf;
use std::process::ExitStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("{0}")]
    PresetMismatch(MismatchReport<String>),

    #[error("{0}")]
    ColumnCountMismatch(MismatchReport<u32>),

    #[error("preset '{name}' not found in {}", path.display())]
    PresetNotFound { name: String, path: PathBuf },

    #[error(
        "missing {}; cannot generate it without {}",
        artifact.display(),
        recipe.display()
    )]
    MissingArtifact { artifact: PathBuf, recipe: PathBuf },

    #[error("failed to run `{tool}`: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{tool}` exited with {status}")]
    ToolFailed { tool: String, status: ExitStatus },

    #[error("failed to read file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid record pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    /// Mismatches are the only failures the harness turns into a structured diagnostic.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::PresetMismatch(_) | Self::ColumnCountMismatch(_))
    }

    /// Process exit status for this failure.
    ///
    /// Fatal errors carry no code of their own and exit the way an unhandled failure would.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingInput { .. } => 2,
            _ => 1,
        }
    }
}

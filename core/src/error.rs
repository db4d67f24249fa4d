use thiserror::Error;

use slidegen_chatgpt::ClientError;

/// Pipeline-level failures. Input and moderation rejections surface to the
/// caller; everything else is caught by the orchestrator and routed to the
/// fallback factory.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request blocked by content safety (score {score}): {}", categories.join(", "))]
    Moderation {
        categories: Vec<String>,
        score: u32,
    },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("processing error: {0}")]
    Processing(String),
}

impl PipelineError {
    /// Rejections the caller must see; never substituted with a fallback.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidInput(_) | PipelineError::Moderation { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

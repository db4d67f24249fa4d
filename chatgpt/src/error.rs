use thiserror::Error;

/// Everything that can go wrong between building a request and handing a
/// validated document back. Each variant carries the request id so log
/// lines stay correlatable across retries.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("[{request_id}] api returned {status}: {message}")]
    Api {
        request_id: String,
        status: u16,
        message: String,
    },

    #[error("[{request_id}] request timed out after {timeout_secs}s")]
    Timeout {
        request_id: String,
        timeout_secs: u64,
    },

    #[error("[{request_id}] transport error: {message}")]
    Transport {
        request_id: String,
        message: String,
    },

    #[error("[{request_id}] response was not valid JSON: {message}")]
    Parse {
        request_id: String,
        message: String,
    },

    #[error("[{request_id}] response carried no content")]
    NoContent { request_id: String },

    #[error("[{request_id}] response of {size} bytes exceeds the {limit} byte limit")]
    ResponseTooLarge {
        request_id: String,
        size: usize,
        limit: usize,
    },

    #[error("[{request_id}] document failed schema validation: {}", issues.join("; "))]
    Validation {
        request_id: String,
        issues: Vec<String>,
    },
}

impl ClientError {
    /// Transient failures are worth another attempt; a deterministic
    /// schema mismatch or an oversized body is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Api { status, .. } => *status >= 500,
            ClientError::Timeout { .. }
            | ClientError::Transport { .. }
            | ClientError::Parse { .. }
            | ClientError::NoContent { .. } => true,
            ClientError::ResponseTooLarge { .. } | ClientError::Validation { .. } => false,
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            ClientError::Api { request_id, .. }
            | ClientError::Timeout { request_id, .. }
            | ClientError::Transport { request_id, .. }
            | ClientError::Parse { request_id, .. }
            | ClientError::NoContent { request_id }
            | ClientError::ResponseTooLarge { request_id, .. }
            | ClientError::Validation { request_id, .. } => request_id,
        }
    }
}

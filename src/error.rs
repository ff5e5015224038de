use thiserror::Error;

/// Run-level failures surfaced by the pipeline
///
/// Every run terminates in one of these or in a RunStatus; nothing
/// panics out of a run. Transient relay faults are absorbed by the
/// bundle retry machine and only become visible here once retries
/// are exhausted.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Market data collaborator returned empty or partial data.
    /// The run aborts before any signal/risk/execution computation.
    #[error("market data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Bundle retries exhausted without inclusion.
    #[error("bundle submission exhausted after {attempts} attempts")]
    SubmissionExhausted { attempts: u32 },
}

/// Faults raised by the private bundle relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay has no record of the bundle for the target slot.
    /// Treated as ordinary non-inclusion, not as an error.
    #[error("bundle not found at target slot")]
    NotFound,

    /// The relay answered with an RPC-level error.
    #[error("relay rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Network-level failure reaching the relay or chain endpoint.
    #[error("relay transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl RelayError {
    /// Transient faults count as a failed attempt and trigger a retry
    /// against the next slot; only exhaustion surfaces to the caller.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RelayError::NotFound | RelayError::Transport(_) | RelayError::Rpc { .. }
        )
    }
}

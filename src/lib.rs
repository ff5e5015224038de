// Core modules
pub mod api;
pub mod error;
pub mod execution;
pub mod grid;
pub mod indicators;
pub mod models;
pub mod pipeline;
pub mod risk;
pub mod signal;

// Re-export commonly used types
pub use error::PipelineError;
pub use models::*;
pub use pipeline::{Pipeline, PipelineConfig, RunStatus};

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

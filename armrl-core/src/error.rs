use thiserror::Error;

/// Errors surfaced by the training loop and its components.
///
/// A missing observation is not an error (the env returns `Ok(None)` and the
/// cycle is skipped), and neither is a not-yet-warm replay buffer during
/// `train` (the learning phase no-ops). Everything here is either recovered
/// at the boundary nearest its origin (checkpoint loads fall back to fresh
/// state) or indicates a real defect.
#[derive(Debug, Error)]
pub enum Error {
    #[error("need {needed} transitions to sample a batch, buffer holds {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("checkpoint io: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint encode: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("checkpoint decode: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("config: {0}")]
    Config(String),

    #[error("environment: {0}")]
    Env(String),

    #[error("agent: {0}")]
    Agent(String),
}

pub type Result<T> = std::result::Result<T, Error>;

//! The engine's own error type.
//!
//! Step-level failures (`blocked`, `wall_crash`, `out_of_battery`, ...)
//! are not errors — they are `Step` data, per the command-service error
//! taxonomy. `EngineError` only covers the one truly exceptional path:
//! a config that fails validation.

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

use std::fmt;

use crate::vector::Vec3;

/// Failure reported by a custom distance or line-of-sight strategy.
/// Never escapes the manager: the caller logs it and substitutes the default
/// policy for that one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyError {
    /// The strategy produced a vector with NaN or infinite components.
    InvalidVector(Vec3),
    /// The strategy gave up for its own reasons.
    Failed(String),
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyError::InvalidVector(v) => {
                write!(f, "invalid vector ({}, {}, {})", v.x, v.y, v.z)
            }
            StrategyError::Failed(msg) => write!(f, "strategy failed: {msg}"),
        }
    }
}

impl std::error::Error for StrategyError {}

pub type StrategyResult<T> = std::result::Result<T, StrategyError>;

use std::fmt;

use serde::{Deserialize, Serialize};

/// How strongly a sensor believes in a signal.
///
/// Totally ordered: `None < Low < Medium < High`. Detection escalates a belief
/// immediately; the cooldown pass decays it one step per elapsed phase.
/// `None` is absorbing for decay.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Awareness {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Awareness {
    /// One step down, saturating at `None`.
    pub fn lowered(self) -> Self {
        match self {
            Self::None | Self::Low => Self::None,
            Self::Medium => Self::Low,
            Self::High => Self::Medium,
        }
    }

    pub fn is_aware(self) -> bool {
        self > Self::None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Awareness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

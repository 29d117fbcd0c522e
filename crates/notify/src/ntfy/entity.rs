use courier_core::notify::error::NotifyError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// Message priority as understood by ntfy (1 = min, 5 = max).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Min,
    Low,
    #[default]
    Default,
    High,
    Max,
}

impl Priority {
    /// Numeric value sent on the wire.
    pub fn as_u8(self) -> u8 {
        match self {
            Priority::Min => 1,
            Priority::Low => 2,
            Priority::Default => 3,
            Priority::High => 4,
            Priority::Max => 5,
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = NotifyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Min),
            2 => Ok(Priority::Low),
            3 => Ok(Priority::Default),
            4 => Ok(Priority::High),
            5 => Ok(Priority::Max),
            _ => Err(NotifyError::Config(format!(
                "ntfy priority must be within 1..=5, got {}",
                value
            ))),
        }
    }
}

impl FromStr for Priority {
    type Err = NotifyError;

    /// Accepts both the names ntfy documents (`urgent` included) and `1`..`5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "min" | "1" => Ok(Priority::Min),
            "low" | "2" => Ok(Priority::Low),
            "default" | "3" => Ok(Priority::Default),
            "high" | "4" => Ok(Priority::High),
            "max" | "urgent" | "5" => Ok(Priority::Max),
            _ => Err(NotifyError::Config(format!("Unknown ntfy priority: {}", s))),
        }
    }
}

/// # Summary
/// How ntfy clients should display the message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Text,
    Markdown,
}

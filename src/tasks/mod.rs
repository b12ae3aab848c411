//! Prompt recipes for common text tasks.
//!
//! Each module pairs pure prompt builders with a thin runner over
//! [`Assistant`](crate::assistant::Assistant), so prompts can be checked
//! without a server.

pub mod code;
pub mod content;
pub mod extract;
pub mod few_shot;
pub mod optimizer;
pub mod qa;
pub mod sentiment;
pub mod summarize;
pub mod temperature;
pub mod translation;

use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;

/// Size hint shared by summaries and generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Short,
    #[default]
    Medium,
    Long,
}

impl FromStr for Length {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(Length::Short),
            "medium" => Ok(Length::Medium),
            "long" => Ok(Length::Long),
            _ => Err(format!("Invalid length: '{}' (expected short, medium or long)", s)),
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Length::Short => "short",
            Length::Medium => "medium",
            Length::Long => "long",
        };
        f.write_str(name)
    }
}

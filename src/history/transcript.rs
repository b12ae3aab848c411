use chrono::{ DateTime, Utc };
use log::info;
use serde::{ Deserialize, Serialize };
use std::fs;
use std::path::Path;

use super::HistoryError;
use crate::models::chat::ChatMessage;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    pub created: DateTime<Utc>,
}

/// On-disk form: `{"metadata": {"created": ...}, "messages": [...]}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub metadata: TranscriptMetadata,
    pub messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), HistoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Saved {} message(s) to {}", self.messages.len(), path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

use chrono::DateTime;
use serde::{ Deserialize, Serialize };
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
}

impl ModelInfo {
    /// Base model name, e.g. `llama3` for `llama3:70b`.
    pub fn family(&self) -> &str {
        self.name.split(':').next().unwrap_or(&self.name)
    }

    /// `modified_at` as `YYYY-MM-DD HH:MM`, or verbatim when it does not parse.
    pub fn modified_display(&self) -> String {
        match &self.modified_at {
            Some(raw) =>
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|_| raw.clone()),
            None => String::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub modelfile: String,
    #[serde(default)]
    pub parameters: String,
    #[serde(default)]
    pub template: String,
}

pub fn format_bytes(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

pub fn group_by_family(models: &[ModelInfo]) -> BTreeMap<String, Vec<ModelInfo>> {
    let mut families: BTreeMap<String, Vec<ModelInfo>> = BTreeMap::new();
    for model in models {
        families.entry(model.family().to_string()).or_default().push(model.clone());
    }
    families
}

/// First model whose name contains `name`, ignoring case.
pub fn find_model<'a>(models: &'a [ModelInfo], name: &str) -> Option<&'a ModelInfo> {
    let needle = name.to_lowercase();
    models.iter().find(|m| m.name.to_lowercase().contains(&needle))
}

pub fn total_size(models: &[ModelInfo]) -> u64 {
    models.iter().map(|m| m.size).sum()
}

/// Shortens `text` to `max` characters, marking the cut with `...`.
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

use serde::Deserialize;
use std::collections::{ BTreeMap, HashMap };
use std::fs;
use std::path::Path;
use thiserror::Error;
use log::info;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template '{0}' not found")] TemplateNotFound(String),
    #[error("Missing value for template variable '{0}'")] MissingVariable(String),
    #[error("Malformed template: {0}")] Malformed(String),
    #[error("Prompt file IO error: {0}")] IoError(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")] JsonError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A `{variable}` template. `{{` and `}}` are literal braces.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn parse(source: &str) -> Result<Self, PromptError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => {
                                break;
                            }
                            Some('{') | None => {
                                return Err(
                                    PromptError::Malformed(format!("unclosed '{{' in: {}", source))
                                );
                            }
                            Some(ch) => name.push(ch),
                        }
                    }
                    let name = name.trim().to_string();
                    if name.is_empty() {
                        return Err(PromptError::Malformed(format!("empty placeholder in: {}", source)));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Variable(name));
                }
                '}' => {
                    return Err(PromptError::Malformed(format!("single '}}' in: {}", source)));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { source: source.to_string(), segments })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Variable(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Fills every placeholder; unused values are ignored.
    pub fn fill(&self, values: &[(&str, &str)]) -> Result<String, PromptError> {
        let lookup: HashMap<&str, &str> = values.iter().copied().collect();
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = lookup
                        .get(name.as_str())
                        .ok_or_else(|| PromptError::MissingVariable(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PromptConfig {
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

impl PromptConfig {
    pub fn builtin() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(
            "translation".to_string(),
            "Translate the following text to {language}: '{text}'".to_string()
        );
        templates.insert(
            "summary".to_string(),
            "Summarize the following text in {num_sentences} sentences: {text}".to_string()
        );
        templates.insert("qa".to_string(), "Context: {context}\n\nQuestion: {question}".to_string());
        Self { templates }
    }

    pub fn template(&self, key: &str) -> Result<PromptTemplate, PromptError> {
        let source = self.templates
            .get(key)
            .ok_or_else(|| PromptError::TemplateNotFound(key.to_string()))?;
        PromptTemplate::parse(source)
    }

    /// Built-ins overridden by `other`.
    pub fn merged_with(mut self, other: PromptConfig) -> Self {
        self.templates.extend(other.templates);
        self
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<PromptConfig, PromptError> {
    let file_content = fs::read_to_string(&path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    info!(
        "Loaded {} prompt template(s) from {}",
        config.templates.len(),
        path.as_ref().display()
    );
    Ok(config)
}

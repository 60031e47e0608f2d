use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const ANALYZE_PROMPT: &str = "Analyze the following text and provide key insights:\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Summarize,
    Translate,
    Analyze,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Summarize => "summarize",
            Task::Translate => "translate",
            Task::Analyze => "analyze",
        }
    }

    /// The text actually sent upstream for this task.
    pub fn build_input(&self, text: &str) -> String {
        match self {
            Task::Analyze => format!("{ANALYZE_PROMPT}{text}"),
            Task::Summarize | Task::Translate => text.to_string(),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summarize" => Ok(Task::Summarize),
            "translate" => Ok(Task::Translate),
            "analyze" => Ok(Task::Analyze),
            other => Err(ValidationError::InvalidTask(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpstreamPayload {
    pub inputs: String,
}

/// One element of the upstream output array. Models disagree on the field
/// name, so all three known names are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputRecord {
    #[serde(default)]
    pub summary_text: Option<String>,
    #[serde(default)]
    pub translation_text: Option<String>,
    #[serde(default)]
    pub generated_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedText {
    Summary(String),
    Translation(String),
    Generated(String),
}

impl OutputRecord {
    /// Picks the first non-empty field in the fixed order `summary_text`,
    /// `translation_text`, `generated_text`. The order does not depend on the
    /// task that produced the record.
    pub fn into_generated(self) -> Option<GeneratedText> {
        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());

        non_empty(self.summary_text)
            .map(GeneratedText::Summary)
            .or_else(|| non_empty(self.translation_text).map(GeneratedText::Translation))
            .or_else(|| non_empty(self.generated_text).map(GeneratedText::Generated))
    }
}

impl GeneratedText {
    pub fn into_text(self) -> String {
        match self {
            GeneratedText::Summary(s)
            | GeneratedText::Translation(s)
            | GeneratedText::Generated(s) => s,
        }
    }
}

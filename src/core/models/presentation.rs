use super::key::KeyRef;

/// Result of a background operation, handed to the UI thread once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Info(String),
    Warning(String),
    Error(String),
    /// Show the key with the import summary above it.
    KeyDetail { key: KeyRef, summary: String },
}

impl Presentation {
    /// The message text, or the summary for key details.
    pub fn message(&self) -> &str {
        match self {
            Presentation::Info(msg) | Presentation::Warning(msg) | Presentation::Error(msg) => msg,
            Presentation::KeyDetail { summary, .. } => summary,
        }
    }
}

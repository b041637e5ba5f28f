//! # Prompt Assembly
//!
//! Turns pasted work notes into the message list sent upstream. The preamble
//! fixes the assistant's role once, server-side, so clients only ever send
//! raw notes.

use crate::{config::Config, schemas::Message};

/// Instruction prepended to every batch of notes unless overridden.
pub const DEFAULT_PREAMBLE: &str = "You are an experienced professional who turns rough work \
notes into a polished weekly report. Organize the notes into clear sections, describe \
accomplishments in complete sentences, keep the tone factual and concise, and format the \
result as Markdown.";

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    preamble: String,
}

impl PromptBuilder {
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.effective_preamble())
    }

    /// Build the message list for one generate request.
    pub fn build(&self, notes: &str) -> Vec<Message> {
        vec![Message::user(format!("{}\n\n{}", self.preamble, notes))]
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PREAMBLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_follow_the_preamble() {
        let builder = PromptBuilder::new("Write a report.");
        let messages = builder.build("fixed the login bug");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "Write a report.\n\nfixed the login bug");
    }

    #[test]
    fn default_uses_builtin_preamble() {
        let messages = PromptBuilder::default().build("notes");
        assert!(messages[0].content.starts_with(DEFAULT_PREAMBLE));
    }
}

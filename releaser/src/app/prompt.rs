//! Operator confirmation

use crate::errors::ReleaserError;

/// Asks the operator before a mutation
pub trait Confirmer {
    fn confirm(&self, question: &str) -> Result<bool, ReleaserError>;
}

/// Interactive terminal prompt, defaulting to "no"
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, question: &str) -> Result<bool, ReleaserError> {
        dialoguer::Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|e| ReleaserError::Internal(format!("confirmation prompt failed: {}", e)))
    }
}

/// Answers every question the same way; used when prompting is disabled
pub struct FixedConfirmer(pub bool);

impl Confirmer for FixedConfirmer {
    fn confirm(&self, _question: &str) -> Result<bool, ReleaserError> {
        Ok(self.0)
    }
}

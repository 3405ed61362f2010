//! Changed-warning confirmation.

use crate::domain::errors::WorkbenchError;
use crate::domain::model::ChangeDecision;

/// Asks the user whether to save, discard, or cancel when closing a
/// document with unsaved changes.
///
/// Implementations block the calling flow until the user responds and never
/// auto-resolve. When no surface is available to show the question they
/// return [`WorkbenchError::PromptUnavailable`]; callers treat that as
/// [`ChangeDecision::Cancel`] so unconfirmed work is never discarded.
pub trait ChangedPrompt {
    fn ask(&mut self, label: Option<&str>) -> Result<ChangeDecision, WorkbenchError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Replays a fixed sequence of decisions and counts how often it was
    /// consulted.
    pub struct ScriptedPrompt {
        decisions: Vec<ChangeDecision>,
        pub asked: usize,
    }

    impl ScriptedPrompt {
        pub fn new(decisions: Vec<ChangeDecision>) -> Self {
            Self { decisions, asked: 0 }
        }
    }

    impl ChangedPrompt for ScriptedPrompt {
        fn ask(&mut self, _label: Option<&str>) -> Result<ChangeDecision, WorkbenchError> {
            self.asked += 1;
            if self.decisions.is_empty() {
                return Err(WorkbenchError::PromptUnavailable);
            }
            Ok(self.decisions.remove(0))
        }
    }

    /// Prompt with no surface behind it.
    pub struct UnavailablePrompt;

    impl ChangedPrompt for UnavailablePrompt {
        fn ask(&mut self, _label: Option<&str>) -> Result<ChangeDecision, WorkbenchError> {
            Err(WorkbenchError::PromptUnavailable)
        }
    }
}

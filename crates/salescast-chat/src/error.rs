//! Error types for the conversational assistant.

/// Reasons a question was not sent.
///
/// Failures of the service itself are not errors here; they become
/// assistant messages in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("question exceeds maximum length of {0} characters")]
    QuestionTooLong(usize),
    #[error("the AI context is not ready")]
    ContextNotReady,
    #[error("a question is already being answered")]
    Busy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::Disabled.to_string(), "chat is disabled");
        assert_eq!(
            ChatError::QuestionTooLong(2000).to_string(),
            "question exceeds maximum length of 2000 characters"
        );
        assert_eq!(ChatError::ContextNotReady.to_string(), "the AI context is not ready");
        assert_eq!(ChatError::Busy.to_string(), "a question is already being answered");
    }
}

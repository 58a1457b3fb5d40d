//! Outcome of a single grammar-rule match attempt.
//!
//! A rule that does not match reports one of two things: a clean non-match
//! (`intercept == false`), after which the caller may try a sibling
//! alternative, or a hard error (`intercept == true`) once the rule had
//! committed to a construct. Intercepted statuses are never swallowed by
//! alternation; they travel up to the top-level rule unchanged.

use crate::token::Span;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseStatus {
    /// Input ended inside the construct; more tokens could make it match.
    pub require_more_tokens: bool,
    /// The construct started but could not be completed.
    pub intercept: bool,
    pub message: Option<String>,
    /// Token at which matching stopped, `None` at end of input.
    pub span: Option<Span>,
}

pub type ParseResult<T> = Result<T, ParseStatus>;

impl ParseStatus {
    pub fn no_match(span: Option<Span>) -> Self {
        Self {
            require_more_tokens: span.is_none(),
            intercept: false,
            message: None,
            span,
        }
    }

    /// Promotes the status to a hard error, keeping the innermost message.
    pub fn intercepted(mut self, message: impl Into<String>) -> Self {
        self.intercept = true;
        if self.message.is_none() {
            self.message = Some(message.into());
        }
        self
    }

    /// Marks the status fatal when the rule was required to match.
    pub fn required(mut self, required: bool) -> Self {
        self.intercept |= required;
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_at_end_of_input_requests_more_tokens() {
        let status = ParseStatus::no_match(None);
        assert!(status.require_more_tokens);
        assert!(!status.is_fatal());

        let status = ParseStatus::no_match(Some(Span::default()));
        assert!(!status.require_more_tokens);
    }

    #[test]
    fn intercepted_keeps_innermost_message() {
        let inner = ParseStatus::no_match(None).intercepted("inner");
        let outer = inner.intercepted("outer");
        assert!(outer.is_fatal());
        assert_eq!(outer.message.as_deref(), Some("inner"));
    }

    #[test]
    fn required_only_escalates() {
        let status = ParseStatus::no_match(None).required(false);
        assert!(!status.is_fatal());
        let status = status.required(true).required(false);
        assert!(status.is_fatal());
    }
}

//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// Whether a label marks the offending location or a related one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    /// The statement or token that caused the diagnostic.
    Primary,
    /// Context such as the first declaration of a duplicated node.
    Secondary,
}

/// A message attached to a span of diagram source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    span: Span,
    message: String,
    role: LabelRole,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self::with_role(span, message, LabelRole::Primary)
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self::with_role(span, message, LabelRole::Secondary)
    }

    fn with_role(span: Span, message: impl Into<String>, role: LabelRole) -> Self {
        Self {
            span,
            message: message.into(),
            role,
        }
    }

    /// The span this label points at.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn role(&self) -> LabelRole {
        self.role
    }

    pub fn is_primary(&self) -> bool {
        self.role == LabelRole::Primary
    }

    pub fn is_secondary(&self) -> bool {
        self.role == LabelRole::Secondary
    }
}

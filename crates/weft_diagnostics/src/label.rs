//! Secondary locations attached to a diagnostic.

use serde::{Deserialize, Serialize};
use weft_source::Span;

/// Whether a label marks the main location or extra context.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LabelStyle {
    /// The location the diagnostic is about.
    Primary,
    /// A related location, such as the first definition of a redefined name.
    Secondary,
}

/// A span with a short message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    /// The annotated location.
    pub span: Span,
    /// Text shown next to the location.
    pub message: String,
    /// Primary or secondary.
    pub style: LabelStyle,
}

impl Label {
    /// Creates a primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    /// Creates a secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles() {
        assert_eq!(Label::primary(Span::DUMMY, "here").style, LabelStyle::Primary);
        let l = Label::secondary(Span::at(2, 1), "first bound here");
        assert_eq!(l.style, LabelStyle::Secondary);
        assert_eq!(l.message, "first bound here");
    }
}

//! Diagnostics produced while compiling a template.
//!
//! Nothing in the compiler is fatal: parse, transform and expression errors
//! are collected, forwarded to the optional callbacks in
//! [`CompilerOptions`](crate::CompilerOptions), and returned with the output.

use std::fmt;
use template_span::Span;
use thiserror::Error;

/// An error or warning reported during compilation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// The span where the error occurred.
    pub span: Span,
    pub severity: Severity,
}

impl CompileError {
    /// Create an error with the code's default message.
    pub fn new(code: ErrorCode, span: Span) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            span,
            severity: Severity::Error,
        }
    }

    /// Create an error with a custom message.
    pub fn with_message(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            severity: Severity::Error,
        }
    }

    /// Downgrade this diagnostic to a warning.
    pub fn into_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// Error codes for template compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorCode {
    // parse errors
    EofInTag,
    EofInComment,
    MissingEndTag,
    InvalidEndTag,
    MissingEndTagName,
    MissingInterpolationEnd,
    MissingDirectiveName,
    MissingDynamicDirectiveArgumentEnd,
    DuplicateAttribute,
    MissingAttributeValue,

    // transform errors
    VIfNoExpression,
    VElseNoAdjacentIf,
    VForNoExpression,
    VForMalformedExpression,
    VForTemplateKeyPlacement,
    VBindNoExpression,
    VOnNoExpression,
    VSlotUnexpectedDirectiveOnSlotOutlet,
    VSlotMixedSlotUsage,
    VSlotDuplicateSlotNames,
    VSlotExtraneousDefaultSlotChildren,
    VSlotMisplaced,
    VModelNoExpression,
    VModelMalformedExpression,
    VModelOnScopeVariable,

    // expression errors
    InvalidExpression,

    // platform errors, raised by platform transforms
    VHtmlNoExpression,
    VHtmlWithChildren,
    VTextNoExpression,
    VTextWithChildren,
    VModelOnInvalidElement,
    VModelArgOnElement,
    VModelOnFileInputElement,
    VModelUnnecessaryValue,
    VShowNoExpression,
    IgnoredSideEffectTag,
}

impl ErrorCode {
    /// Get the error code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EofInTag => "eof-in-tag",
            Self::EofInComment => "eof-in-comment",
            Self::MissingEndTag => "missing-end-tag",
            Self::InvalidEndTag => "invalid-end-tag",
            Self::MissingEndTagName => "missing-end-tag-name",
            Self::MissingInterpolationEnd => "missing-interpolation-end",
            Self::MissingDirectiveName => "missing-directive-name",
            Self::MissingDynamicDirectiveArgumentEnd => "missing-dynamic-directive-argument-end",
            Self::DuplicateAttribute => "duplicate-attribute",
            Self::MissingAttributeValue => "missing-attribute-value",
            Self::VIfNoExpression => "v-if-no-expression",
            Self::VElseNoAdjacentIf => "v-else-no-adjacent-if",
            Self::VForNoExpression => "v-for-no-expression",
            Self::VForMalformedExpression => "v-for-malformed-expression",
            Self::VForTemplateKeyPlacement => "v-for-template-key-placement",
            Self::VBindNoExpression => "v-bind-no-expression",
            Self::VOnNoExpression => "v-on-no-expression",
            Self::VSlotUnexpectedDirectiveOnSlotOutlet => "v-slot-unexpected-directive-on-slot-outlet",
            Self::VSlotMixedSlotUsage => "v-slot-mixed-slot-usage",
            Self::VSlotDuplicateSlotNames => "v-slot-duplicate-slot-names",
            Self::VSlotExtraneousDefaultSlotChildren => "v-slot-extraneous-default-slot-children",
            Self::VSlotMisplaced => "v-slot-misplaced",
            Self::VModelNoExpression => "v-model-no-expression",
            Self::VModelMalformedExpression => "v-model-malformed-expression",
            Self::VModelOnScopeVariable => "v-model-on-scope-variable",
            Self::InvalidExpression => "invalid-expression",
            Self::VHtmlNoExpression => "v-html-no-expression",
            Self::VHtmlWithChildren => "v-html-with-children",
            Self::VTextNoExpression => "v-text-no-expression",
            Self::VTextWithChildren => "v-text-with-children",
            Self::VModelOnInvalidElement => "v-model-on-invalid-element",
            Self::VModelArgOnElement => "v-model-arg-on-element",
            Self::VModelOnFileInputElement => "v-model-on-file-input-element",
            Self::VModelUnnecessaryValue => "v-model-unnecessary-value",
            Self::VShowNoExpression => "v-show-no-expression",
            Self::IgnoredSideEffectTag => "ignored-side-effect-tag",
        }
    }

    /// Whether this code is raised by the parser.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::EofInTag
                | Self::EofInComment
                | Self::MissingEndTag
                | Self::InvalidEndTag
                | Self::MissingEndTagName
                | Self::MissingInterpolationEnd
                | Self::MissingDirectiveName
                | Self::MissingDynamicDirectiveArgumentEnd
                | Self::DuplicateAttribute
                | Self::MissingAttributeValue
        )
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::EofInTag => "Unexpected EOF in tag.",
            Self::EofInComment => "Unexpected EOF in comment.",
            Self::MissingEndTag => "Element is missing end tag.",
            Self::InvalidEndTag => "Invalid end tag.",
            Self::MissingEndTagName => "End tag name was expected.",
            Self::MissingInterpolationEnd => "Interpolation end sign was not found.",
            Self::MissingDirectiveName => "Legal directive name was expected.",
            Self::MissingDynamicDirectiveArgumentEnd => {
                "End bracket for dynamic directive argument was not found."
            }
            Self::DuplicateAttribute => "Duplicate attribute.",
            Self::MissingAttributeValue => "Attribute value was expected.",
            Self::VIfNoExpression => "v-if/v-else-if is missing expression.",
            Self::VElseNoAdjacentIf => "v-else/v-else-if has no adjacent v-if or v-else-if.",
            Self::VForNoExpression => "v-for is missing expression.",
            Self::VForMalformedExpression => "v-for has invalid expression.",
            Self::VForTemplateKeyPlacement => "<template v-for> key should be placed on the <template> tag.",
            Self::VBindNoExpression => "v-bind is missing expression.",
            Self::VOnNoExpression => "v-on is missing expression.",
            Self::VSlotUnexpectedDirectiveOnSlotOutlet => "Unexpected custom directive on <slot> outlet.",
            Self::VSlotMixedSlotUsage => {
                "Mixed v-slot usage on both the component and nested <template>. \
                 When there are multiple named slots, all slots should use <template> syntax."
            }
            Self::VSlotDuplicateSlotNames => "Duplicate slot names found.",
            Self::VSlotExtraneousDefaultSlotChildren => {
                "Extraneous children found when component already has explicitly named default slot. \
                 These children will be ignored."
            }
            Self::VSlotMisplaced => "v-slot can only be used on components or <template> tags.",
            Self::VModelNoExpression => "v-model is missing expression.",
            Self::VModelMalformedExpression => "v-model value must be a valid JavaScript member expression.",
            Self::VModelOnScopeVariable => {
                "v-model cannot be used on v-for or v-slot scope variables because they are not writable."
            }
            Self::InvalidExpression => "Error parsing JavaScript expression.",
            Self::VHtmlNoExpression => "v-html is missing expression.",
            Self::VHtmlWithChildren => "v-html will override element children.",
            Self::VTextNoExpression => "v-text is missing expression.",
            Self::VTextWithChildren => "v-text will override element children.",
            Self::VModelOnInvalidElement => "v-model can only be used on <input>, <textarea> and <select> elements.",
            Self::VModelArgOnElement => "v-model argument is not supported on plain elements.",
            Self::VModelOnFileInputElement => {
                "v-model cannot be used on file inputs since they are read-only. Use a v-on:change listener instead."
            }
            Self::VModelUnnecessaryValue => {
                "Unnecessary value binding used alongside v-model. It will interfere with v-model's behavior."
            }
            Self::VShowNoExpression => "v-show is missing expression.",
            Self::IgnoredSideEffectTag => {
                "Tags with side effect (<script> and <style>) are ignored in client component templates."
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message_and_code() {
        let err = CompileError::new(ErrorCode::VElseNoAdjacentIf, Span::new(0, 4));
        assert_eq!(err.code.as_str(), "v-else-no-adjacent-if");
        assert_eq!(err.to_string(), ErrorCode::VElseNoAdjacentIf.default_message());
        assert!(err.is_error());
        assert!(!err.into_warning().is_error());
    }

    #[test]
    fn test_parse_error_classification() {
        assert!(ErrorCode::MissingEndTag.is_parse_error());
        assert!(!ErrorCode::VForNoExpression.is_parse_error());
    }
}

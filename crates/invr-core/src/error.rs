//! Error types for the invr-core library.

use thiserror::Error;

/// Main error type for the invr library.
#[derive(Error, Debug)]
pub enum InvrError {
    /// Generation input failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A template was requested by a name the catalog does not know.
    #[error("template '{0}' not found")]
    TemplateNotFound(String),

    /// The document parser could not produce a document.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating generation input.
///
/// Validation stops at the first violation, so exactly one of these is
/// reported per call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required top-level field is missing or blank.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The invoice has no line items.
    #[error("invoice must contain at least one line item")]
    NoLineItems,

    /// A line item lacks one of its required fields (1-based index).
    #[error("line item {index} missing {field}")]
    LineItemMissingField { index: usize, field: &'static str },

    /// A field is present but its value is not acceptable.
    #[error("malformed {field}: '{value}' ({reason})")]
    Malformed {
        field: String,
        value: String,
        reason: String,
    },
}

impl ValidationError {
    /// An amount that does not fit in a `Decimal` once multiplied or summed.
    pub fn out_of_range(field: impl Into<String>, value: impl ToString) -> Self {
        ValidationError::Malformed {
            field: field.into(),
            value: value.to_string(),
            reason: "amount out of range".to_string(),
        }
    }

    /// Name of the field the error refers to.
    pub fn field(&self) -> String {
        match self {
            ValidationError::MissingField(field) => field.clone(),
            ValidationError::NoLineItems => "line_items".to_string(),
            ValidationError::LineItemMissingField { index, field } => {
                format!("line_items[{}].{}", index, field)
            }
            ValidationError::Malformed { field, .. } => field.clone(),
        }
    }
}

/// Errors raised by document parsers.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The input is not syntactically valid for the parser.
    #[error("invalid document syntax: {0}")]
    Syntax(String),

    /// The input parsed but is not shaped like a document.
    #[error("unexpected document shape: {0}")]
    Shape(String),

    /// The input contains no text at all.
    #[error("document is empty")]
    Empty,
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Syntax(err.to_string())
    }
}

/// Result type for the invr library.
pub type Result<T> = std::result::Result<T, InvrError>;

//! Filter types for dynamic task query building.
//!
//! Search expressions arrive from callers as comma-joined
//! `field<op>value` triples (for example `name:PHQ8,order>2`), which are
//! parsed into [`FilterField`] conditions joined with AND.

use serde::{Deserialize, Serialize};

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality (`:`).
    Eq,
    /// Greater than (`>`).
    Gt,
    /// Less than (`<`).
    Lt,
}

impl FilterOp {
    /// Parse a single operator character.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            ':' => Some(Self::Eq),
            '>' => Some(Self::Gt),
            '<' => Some(Self::Lt),
            _ => None,
        }
    }
}

/// A single filter condition on a named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    /// The field name to filter on.
    pub field: String,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value to compare against, as supplied by the caller.
    pub value: String,
}

impl FilterField {
    /// Create a new filter field.
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Shorthand for an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Parse one `field<op>value` triple. Returns `None` for anything that
    /// does not match the expected shape.
    pub fn parse_term(term: &str) -> Option<Self> {
        let term = term.trim();
        let (idx, symbol) = term.char_indices().find(|(_, c)| matches!(c, ':' | '>' | '<'))?;
        let field = &term[..idx];
        let value = &term[idx + symbol.len_utf8()..];
        if field.is_empty()
            || value.is_empty()
            || !field.chars().all(|c| c.is_alphanumeric() || c == '_')
            || !value.chars().all(|c| c.is_alphanumeric() || c == '_')
        {
            return None;
        }
        Some(Self::new(field, FilterOp::from_symbol(symbol)?, value))
    }

    /// Parse a comma-joined search expression into AND-combined conditions.
    /// Malformed terms are skipped.
    pub fn parse_expression(search: &str) -> Vec<Self> {
        search.split(',').filter_map(Self::parse_term).collect()
    }
}

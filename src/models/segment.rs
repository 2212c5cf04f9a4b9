//! Audience segments and backend record identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Audience segment a question is written for.
///
/// The declaration order is the precedence order used when a heading matches
/// patterns of more than one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    /// General members
    Todos,
    /// Children, intermediates and teenagers
    Criancas,
    /// Members with accessibility needs
    Acessibilidade,
}

impl Segment {
    /// All segments in precedence order.
    pub const ALL: [Segment; 3] = [Segment::Todos, Segment::Criancas, Segment::Acessibilidade];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Todos => "todos",
            Segment::Criancas => "criancas",
            Segment::Acessibilidade => "acessibilidade",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary key returned by the backend (integer or UUID depending on table).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{id}"),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        assert!(Segment::Todos < Segment::Criancas);
        assert!(Segment::Criancas < Segment::Acessibilidade);
        assert_eq!(Segment::ALL[0], Segment::Todos);
    }

    #[test]
    fn test_record_id_untagged() {
        let int: RecordId = serde_json::from_str("42").unwrap();
        let text: RecordId = serde_json::from_str("\"9f1c\"").unwrap();
        assert_eq!(int, RecordId::Int(42));
        assert_eq!(text.to_string(), "9f1c");
    }
}

//! Questionnaire and question records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Segment;

/// Lifecycle of a questionnaire within one processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionnaireStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "processado")]
    Processed,
    #[serde(rename = "salvo")]
    Saved,
    #[serde(rename = "erro")]
    Error,
}

impl QuestionnaireStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionnaireStatus::Pending => "pendente",
            QuestionnaireStatus::Processed => "processado",
            QuestionnaireStatus::Saved => "salvo",
            QuestionnaireStatus::Error => "erro",
        }
    }
}

/// One processed PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Questionnaire {
    /// File name of the source PDF (no directory)
    pub source_file: String,

    /// SHA-256 of the PDF bytes, used as the upsert key
    pub file_hash: String,

    /// When processing started
    pub processed_at: DateTime<Utc>,

    /// Number of accepted questions
    pub total_questions: usize,

    /// Fraction of candidate questions accepted
    pub confidence: f64,

    /// E-mail of the user who ran the import
    pub user: String,

    pub status: QuestionnaireStatus,
}

impl Questionnaire {
    /// Start a new questionnaire in the pending state.
    pub fn new(
        source_file: impl Into<String>,
        file_hash: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            file_hash: file_hash.into(),
            processed_at: Utc::now(),
            total_questions: 0,
            confidence: 0.0,
            user: user.into(),
            status: QuestionnaireStatus::Pending,
        }
    }
}

/// Detected shape of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    VerdadeiroFalso,
    MultiplaEscolha,
    Completar,
    Dissertativa,
    Outros,
}

/// A lettered option found inside a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub letra: char,
    pub texto: String,
}

/// A question accepted by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Ordinal printed in the PDF
    pub number: u32,

    /// Audience segment of the enclosing section
    pub segment: Segment,

    /// Heading line that opened the section
    pub section: String,

    pub text: String,

    pub answer: String,

    pub kind: QuestionKind,

    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

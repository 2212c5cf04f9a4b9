// src/models/mod.rs

//! Domain models for the ingestion pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

pub mod config;
mod member;
mod questionnaire;
mod segment;

// Re-export all public types
pub use config::{
    BackendConfig, CategoryConfig, Config, Environment, FolderConfig, ParsingConfig,
    RuntimeConfig, SectionPatterns, SegmentKeywords, TableConfig, ValidationReport,
};
pub use member::{Member, UserProfile};
pub use questionnaire::{AnswerOption, Question, QuestionKind, Questionnaire, QuestionnaireStatus};
pub use segment::{RecordId, Segment};

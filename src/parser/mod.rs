//! Section-aware question extraction from PDF text.
//!
//! The text is cleaned line by line, split into audience sections at heading
//! lines and then scanned for numbered question/answer blocks:
//!
//! ```text
//! PARA TODOS              <- heading, opens a `todos` section
//! 1. Qual o nome?         <- question 1
//! Resposta: João          <- answer of question 1
//! PARA CRIANÇAS           <- heading, opens a `criancas` section
//! 1. Quem criou o mundo?
//! R: Deus
//! ```

mod kind;
mod questions;
mod rules;
mod sections;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::error::Result;
use crate::models::{ParsingConfig, Question, Segment};

pub use kind::{detect_kind, extract_options};
pub use questions::{Candidate, RejectReason, Rejection};
pub use rules::{AnswerKeywords, QuestionPatterns, SectionRules};
pub use sections::{
    DEFAULT_SECTION_LABEL, Section, SectionSplitter, clean_lines, heading_title, uppercase_share,
};

use questions::{Limits, extract_section};

/// Gaps are only listed while the highest ordinal stays below this.
pub const MAX_GAP_SCAN: u32 = 1000;

/// Parser built once from configuration and reused across documents.
#[derive(Debug, Clone)]
pub struct QuestionParser {
    sections: SectionRules,
    questions: QuestionPatterns,
    answers: AnswerKeywords,
    irrelevant: Vec<String>,
    limits: Limits,
    break_confidence: f64,
    min_confidence: f64,
}

impl QuestionParser {
    /// Compile every configured pattern.
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        Ok(Self {
            sections: SectionRules::compile(config)?,
            questions: QuestionPatterns::compile(config)?,
            answers: AnswerKeywords::new(config),
            irrelevant: config.irrelevant_lines.clone(),
            limits: Limits {
                max_question: config.max_question_length,
                max_answer: config.max_answer_length,
            },
            break_confidence: config.section_break_confidence,
            min_confidence: config.min_confidence,
        })
    }

    /// Parse the full text of one document.
    pub fn parse(&self, text: &str) -> ParseOutcome {
        let lines = clean_lines(text, &self.irrelevant);
        let splitter = SectionSplitter {
            rules: &self.sections,
            questions: &self.questions,
            break_confidence: self.break_confidence,
        };

        let mut outcome = ParseOutcome {
            min_confidence: self.min_confidence,
            ..ParseOutcome::default()
        };

        for section in splitter.split(&lines) {
            let found = extract_section(&section, &self.questions, &self.answers, self.limits);
            log::debug!(
                "Section '{}' ({}): {} accepted, {} rejected",
                section.label,
                section.segment,
                found.questions.len(),
                found.rejections.len()
            );
            outcome.sections.push(SectionSummary {
                segment: section.segment,
                label: section.label,
                questions: found.questions.len(),
            });
            outcome.questions.extend(found.questions);
            outcome.rejections.extend(found.rejections);
        }

        outcome.confidence = outcome.compute_confidence();
        outcome
    }
}

/// One section as seen by the parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSummary {
    pub segment: Segment,
    pub label: String,
    pub questions: usize,
}

/// Result of parsing one document.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// Accepted questions in document order
    pub questions: Vec<Question>,
    pub rejections: Vec<Rejection>,
    pub sections: Vec<SectionSummary>,
    /// Accepted / candidates (0 when there were no candidates)
    pub confidence: f64,
    pub min_confidence: f64,
}

impl ParseOutcome {
    pub fn candidate_count(&self) -> usize {
        self.questions.len() + self.rejections.len()
    }

    fn compute_confidence(&self) -> f64 {
        match self.candidate_count() {
            0 => 0.0,
            total => self.questions.len() as f64 / total as f64,
        }
    }

    /// Confidence is below the configured minimum.
    pub fn is_suspect(&self) -> bool {
        self.confidence < self.min_confidence
    }

    /// Accepted questions per segment (every segment present, possibly 0).
    pub fn counts_by_segment(&self) -> BTreeMap<Segment, usize> {
        let mut counts: BTreeMap<Segment, usize> = Segment::ALL.iter().map(|s| (*s, 0)).collect();
        for question in &self.questions {
            *counts.entry(question.segment).or_default() += 1;
        }
        counts
    }

    /// Quality findings worth surfacing in the report.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut seen = HashSet::new();
        let duplicates = self
            .questions
            .iter()
            .filter(|q| !seen.insert((q.segment, q.text.trim().to_lowercase())))
            .map(|q| (q.segment, q.number))
            .collect();

        let mut numbers: BTreeMap<Segment, BTreeSet<u32>> = BTreeMap::new();
        for question in &self.questions {
            numbers.entry(question.segment).or_default().insert(question.number);
        }
        let mut diagnostics = Diagnostics {
            duplicates,
            ..Diagnostics::default()
        };
        for (segment, present) in numbers {
            let Some(&max) = present.iter().next_back() else {
                continue;
            };
            if max > MAX_GAP_SCAN {
                diagnostics.out_of_range.push((segment, max));
                continue;
            }
            let missing: Vec<u32> = (1..=max).filter(|n| !present.contains(n)).collect();
            if !missing.is_empty() {
                diagnostics.missing_numbers.push((segment, missing));
            }
        }
        diagnostics
    }
}

/// Duplicate texts and gaps in numbering, per segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// (segment, number) of each repeated question text after its first use
    pub duplicates: Vec<(Segment, u32)>,
    pub missing_numbers: Vec<(Segment, Vec<u32>)>,
    /// (segment, highest ordinal) when numbering is too sparse to scan for gaps
    pub out_of_range: Vec<(Segment, u32)>,
}

impl Diagnostics {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
            && self.missing_numbers.is_empty()
            && self.out_of_range.is_empty()
    }
}

//! Question/answer extraction inside one section.

use serde::Serialize;

use crate::models::{Question, Segment};
use crate::utils::push_fragment;

use super::kind::{detect_kind, extract_options};
use super::rules::{AnswerKeywords, QuestionPatterns};
use super::sections::Section;

/// A numbered block before acceptance checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub number: u32,
    pub text: String,
    pub answer: String,
    in_answer: bool,
}

impl Candidate {
    fn new(number: u32, text: &str) -> Self {
        let mut candidate = Self {
            number,
            text: String::new(),
            answer: String::new(),
            in_answer: false,
        };
        candidate.push_question(text);
        candidate
    }

    fn push_question(&mut self, fragment: &str) {
        push_fragment(&mut self.text, fragment);
    }

    fn push_answer(&mut self, fragment: &str) {
        push_fragment(&mut self.answer, fragment);
    }
}

/// Why a candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "motivo", rename_all = "snake_case")]
pub enum RejectReason {
    EmptyQuestion,
    EmptyAnswer,
    QuestionTooLong { chars: usize },
    AnswerTooLong { chars: usize },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::EmptyQuestion => f.write_str("pergunta vazia"),
            RejectReason::EmptyAnswer => f.write_str("resposta vazia"),
            RejectReason::QuestionTooLong { chars } => {
                write!(f, "pergunta muito longa ({chars} caracteres)")
            }
            RejectReason::AnswerTooLong { chars } => {
                write!(f, "resposta muito longa ({chars} caracteres)")
            }
        }
    }
}

/// A dropped candidate, kept for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub segment: Segment,
    pub number: u32,
    pub reason: RejectReason,
}

/// Length limits applied to candidates.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_question: usize,
    pub max_answer: usize,
}

impl Limits {
    fn check(&self, candidate: &Candidate) -> Option<RejectReason> {
        let question_len = candidate.text.chars().count();
        let answer_len = candidate.answer.chars().count();
        if question_len == 0 {
            Some(RejectReason::EmptyQuestion)
        } else if answer_len == 0 {
            Some(RejectReason::EmptyAnswer)
        } else if question_len > self.max_question {
            Some(RejectReason::QuestionTooLong {
                chars: question_len,
            })
        } else if answer_len > self.max_answer {
            Some(RejectReason::AnswerTooLong { chars: answer_len })
        } else {
            None
        }
    }
}

/// Collect numbered candidates from a section's lines.
///
/// Lines before the first numbered line are ignored. After an answer keyword
/// every line belongs to the answer until the next numbered line.
pub fn collect_candidates(
    lines: &[String],
    questions: &QuestionPatterns,
    answers: &AnswerKeywords,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut current: Option<Candidate> = None;

    for line in lines {
        if let Some((number, text)) = questions.match_start(line) {
            candidates.extend(current.replace(Candidate::new(number, text)));
            continue;
        }
        let Some(candidate) = current.as_mut() else {
            continue;
        };
        if candidate.in_answer {
            candidate.push_answer(line);
        } else if let Some(rest) = answers.strip(line) {
            candidate.in_answer = true;
            candidate.push_answer(rest);
        } else {
            candidate.push_question(line);
        }
    }
    candidates.extend(current);

    candidates
}

/// Accepted questions and rejections for one section.
#[derive(Debug, Default)]
pub struct SectionQuestions {
    pub questions: Vec<Question>,
    pub rejections: Vec<Rejection>,
}

/// Extract and filter the questions of one section.
pub fn extract_section(
    section: &Section,
    questions: &QuestionPatterns,
    answers: &AnswerKeywords,
    limits: Limits,
) -> SectionQuestions {
    let mut out = SectionQuestions::default();

    for candidate in collect_candidates(&section.lines, questions, answers) {
        if let Some(reason) = limits.check(&candidate) {
            out.rejections.push(Rejection {
                segment: section.segment,
                number: candidate.number,
                reason,
            });
            continue;
        }
        out.questions.push(Question {
            number: candidate.number,
            segment: section.segment,
            section: section.label.clone(),
            kind: detect_kind(&candidate.text),
            options: extract_options(&candidate.text),
            text: candidate.text,
            answer: candidate.answer,
        });
    }

    out
}

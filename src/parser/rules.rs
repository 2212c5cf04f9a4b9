//! Compiled pattern tables built from [`ParsingConfig`].

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{ParsingConfig, Segment};
use crate::utils::strip_prefix_ci;

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AppError::pattern(pattern, e))
}

/// Heading patterns per segment, kept in configured precedence order.
#[derive(Debug, Clone)]
pub struct SectionRules {
    rules: Vec<(Segment, Vec<Regex>)>,
}

impl SectionRules {
    pub fn compile(config: &ParsingConfig) -> Result<Self> {
        let rules = config
            .sections
            .iter()
            .map(|rule| {
                let patterns = rule
                    .patterns
                    .iter()
                    .map(|p| compile(p))
                    .collect::<Result<Vec<_>>>()?;
                Ok((rule.segment, patterns))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// First segment (in precedence order) with a pattern matching `line`.
    pub fn segment_for(&self, line: &str) -> Option<Segment> {
        self.rules
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(line)))
            .map(|(segment, _)| *segment)
    }
}

/// Alternative question-number forms; group 1 is the ordinal, group 2 the text.
#[derive(Debug, Clone)]
pub struct QuestionPatterns {
    patterns: Vec<Regex>,
}

impl QuestionPatterns {
    pub fn compile(config: &ParsingConfig) -> Result<Self> {
        let patterns = config
            .question_patterns
            .iter()
            .map(|p| {
                let re = compile(p)?;
                if re.captures_len() < 3 {
                    return Err(AppError::pattern(p, "expected ordinal and text groups"));
                }
                Ok(re)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Ordinal and initial text when `line` starts a question.
    pub fn match_start<'a>(&self, line: &'a str) -> Option<(u32, &'a str)> {
        self.patterns.iter().find_map(|re| {
            let caps = re.captures(line)?;
            let number = caps.get(1)?.as_str().parse().ok()?;
            let text = caps.get(2).map_or("", |m| m.as_str());
            Some((number, text))
        })
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.match_start(line).is_some()
    }
}

/// Case-insensitive answer prefixes.
#[derive(Debug, Clone)]
pub struct AnswerKeywords {
    keywords: Vec<String>,
}

impl AnswerKeywords {
    pub fn new(config: &ParsingConfig) -> Self {
        Self {
            keywords: config
                .answer_keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Remainder of `line` after an answer keyword, if it starts with one.
    pub fn strip<'a>(&self, line: &'a str) -> Option<&'a str> {
        let line = line.trim_start();
        self.keywords
            .iter()
            .find_map(|keyword| strip_prefix_ci(line, keyword))
    }
}

//! Line cleaning and audience-section splitting.

use crate::models::Segment;
use crate::utils::normalize_whitespace;

use super::rules::{QuestionPatterns, SectionRules};

/// Label used for text that precedes any recognized heading.
pub const DEFAULT_SECTION_LABEL: &str = "GERAL";

/// A run of lines that belong to one audience segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub segment: Segment,
    /// Heading line that opened the section
    pub label: String,
    pub lines: Vec<String>,
}

/// Split raw text into trimmed lines, dropping blanks and boilerplate.
///
/// Form feeds (page breaks) count as line breaks. `irrelevant` entries are
/// plain case-sensitive substrings.
pub fn clean_lines(text: &str, irrelevant: &[String]) -> Vec<String> {
    text.split(['\n', '\r', '\u{c}'])
        .map(normalize_whitespace)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            !irrelevant
                .iter()
                .any(|marker| !marker.is_empty() && line.contains(marker.as_str()))
        })
        .collect()
}

/// Share of uppercase letters among the letters of `line` (0 when none).
pub fn uppercase_share(line: &str) -> f64 {
    let (upper, letters) = line
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(upper, total), c| {
            (upper + usize::from(c.is_uppercase()), total + 1)
        });
    if letters == 0 {
        0.0
    } else {
        upper as f64 / letters as f64
    }
}

/// Title part of a heading line, before any parenthesised or dashed subtitle.
///
/// `"PARA CRIANÇAS (de 4 a 8 anos)"` gives `"PARA CRIANÇAS"`.
pub fn heading_title(line: &str) -> &str {
    let end = ["(", "[", ":", " - ", " – ", " — "]
        .iter()
        .filter_map(|delimiter| line.find(delimiter))
        .min()
        .unwrap_or(line.len());
    match line[..end].trim_end() {
        "" => line,
        title => title,
    }
}

/// Splits cleaned lines into sections at heading lines.
pub struct SectionSplitter<'a> {
    pub rules: &'a SectionRules,
    pub questions: &'a QuestionPatterns,
    /// Minimum [`uppercase_share`] for a heading line
    pub break_confidence: f64,
}

impl SectionSplitter<'_> {
    /// Segment opened by `line`, if it is a heading.
    ///
    /// Numbered question lines are never headings. The pattern and the
    /// uppercase share are both checked on the [`heading_title`] only.
    pub fn heading(&self, line: &str) -> Option<Segment> {
        if self.questions.is_match(line) {
            return None;
        }
        let title = heading_title(line);
        let segment = self.rules.segment_for(title)?;
        (uppercase_share(title) >= self.break_confidence).then_some(segment)
    }

    /// Group lines into sections. Lines before the first heading (or the
    /// whole input when there is none) form a default `todos` section.
    pub fn split(&self, lines: &[String]) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut current = Section {
            segment: Segment::Todos,
            label: DEFAULT_SECTION_LABEL.to_string(),
            lines: Vec::new(),
        };
        let mut in_default = true;

        for line in lines {
            match self.heading(line) {
                Some(segment) => {
                    let next = Section {
                        segment,
                        label: line.clone(),
                        lines: Vec::new(),
                    };
                    let finished = std::mem::replace(&mut current, next);
                    // an empty preamble is not a section
                    if !(in_default && finished.lines.is_empty()) {
                        sections.push(finished);
                    }
                    in_default = false;
                }
                None => current.lines.push(line.clone()),
            }
        }
        sections.push(current);

        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParsingConfig;

    fn splitter_parts() -> (SectionRules, QuestionPatterns) {
        let config = ParsingConfig::default();
        (
            SectionRules::compile(&config).unwrap(),
            QuestionPatterns::compile(&config).unwrap(),
        )
    }

    #[test]
    fn test_clean_lines_drops_boilerplate() {
        let irrelevant = ParsingConfig::default().irrelevant_lines;
        let text = "IGREJA CRISTÃ MARANATA\n\n  1.  Qual   o nome?\u{c}Página 2\nR: João\r\n";
        assert_eq!(
            clean_lines(text, &irrelevant),
            vec!["1. Qual o nome?".to_string(), "R: João".to_string()]
        );
    }

    #[test]
    fn test_irrelevant_match_is_case_sensitive() {
        let irrelevant = vec!["Página".to_string()];
        assert_eq!(clean_lines("PÁGINA 3", &irrelevant), vec!["PÁGINA 3".to_string()]);
    }

    #[test]
    fn test_uppercase_share() {
        assert_eq!(uppercase_share("PARA TODOS"), 1.0);
        assert_eq!(uppercase_share("1 - 2"), 0.0);
        assert!(uppercase_share("os ADOLESCENTES da igreja") < 0.6);
    }

    #[test]
    fn test_heading_title_drops_subtitle() {
        assert_eq!(heading_title("PARA CRIANÇAS (de 4 a 8 anos de idade)"), "PARA CRIANÇAS");
        assert_eq!(heading_title("ACESSIBILIDADE - surdos e cegos"), "ACESSIBILIDADE");
        assert_eq!(heading_title("os ADOLESCENTES da igreja"), "os ADOLESCENTES da igreja");
        assert_eq!(heading_title("(nota)"), "(nota)");
    }

    #[test]
    fn test_lowercase_subtitle_does_not_block_heading() {
        let (rules, questions) = splitter_parts();
        let splitter = SectionSplitter {
            rules: &rules,
            questions: &questions,
            break_confidence: 0.6,
        };
        assert_eq!(
            splitter.heading("PARA CRIANÇAS (de 4 a 8 anos de idade)"),
            Some(Segment::Criancas)
        );
        assert_eq!(splitter.heading("Lição de hoje (PARA CRIANÇAS)"), None);
        assert_eq!(splitter.heading("os ADOLESCENTES da igreja"), None);
    }

    #[test]
    fn test_split_without_headings_is_single_todos_section() {
        let (rules, questions) = splitter_parts();
        let splitter = SectionSplitter {
            rules: &rules,
            questions: &questions,
            break_confidence: 0.6,
        };
        let lines = vec!["1. Pergunta".to_string(), "R: resposta".to_string()];

        let sections = splitter.split(&lines);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].segment, Segment::Todos);
        assert_eq!(sections[0].label, DEFAULT_SECTION_LABEL);
        assert_eq!(sections[0].lines.len(), 2);
    }

    #[test]
    fn test_split_on_headings() {
        let (rules, questions) = splitter_parts();
        let splitter = SectionSplitter {
            rules: &rules,
            questions: &questions,
            break_confidence: 0.6,
        };
        let lines: Vec<String> = [
            "PARA CRIANÇAS (4 a 8 anos)",
            "1. Quem criou o mundo?",
            "os ADOLESCENTES da igreja",
            "NECESSIDADES ESPECIAIS",
            "2. Quem é o pastor? Os ADULTOS sabem",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let sections = splitter.split(&lines);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].segment, Segment::Criancas);
        assert_eq!(sections[0].lines.len(), 2);
        assert_eq!(sections[1].segment, Segment::Acessibilidade);
        assert_eq!(sections[1].label, "NECESSIDADES ESPECIAIS");
        assert_eq!(sections[1].lines.len(), 1);
    }

    #[test]
    fn test_heading_matching_two_segments_uses_precedence() {
        let (rules, questions) = splitter_parts();
        let splitter = SectionSplitter {
            rules: &rules,
            questions: &questions,
            break_confidence: 0.6,
        };
        assert_eq!(
            splitter.heading("ADOLESCENTES E ADULTOS"),
            Some(Segment::Todos)
        );
    }
}

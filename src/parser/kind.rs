//! Question kind detection and multiple-choice option extraction.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{AnswerOption, QuestionKind};

static CHOICE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)\(?([a-d])\)\s*").expect("valid regex"));

/// Classify a question by its wording.
pub fn detect_kind(text: &str) -> QuestionKind {
    let lower = text.to_lowercase();

    if lower.contains("verdadeiro") && lower.contains("falso") {
        return QuestionKind::VerdadeiroFalso;
    }
    if lower.contains("múltipla escolha") || CHOICE_MARKER.is_match(text) {
        return QuestionKind::MultiplaEscolha;
    }
    if lower.contains("complete") || lower.contains("preencha") {
        return QuestionKind::Completar;
    }
    if text.contains('?') {
        return QuestionKind::Dissertativa;
    }
    QuestionKind::Outros
}

/// Lettered options (`a)` .. `d)`, optionally parenthesised) in `text`.
///
/// A single marker is not a list, so fewer than two yields nothing.
pub fn extract_options(text: &str) -> Vec<AnswerOption> {
    let markers: Vec<_> = CHOICE_MARKER.captures_iter(text).collect();
    if markers.len() < 2 {
        return Vec::new();
    }

    markers
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let letter = caps.get(1)?.as_str().chars().next()?.to_ascii_lowercase();
            let end = markers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |m| m.start());
            let option = text[whole.end()..end].trim();
            (!option.is_empty()).then(|| AnswerOption {
                letra: letter,
                texto: option.to_string(),
            })
        })
        .collect()
}

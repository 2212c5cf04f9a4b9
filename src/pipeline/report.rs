//! Final human-readable report of a processing run.

use crate::models::Segment;
use crate::utils::console;

use super::process::ProcessingResult;

/// At most this many rejections are listed individually.
const MAX_LISTED_REJECTIONS: usize = 5;

/// At most this many missing ordinals are listed per segment.
const MAX_LISTED_GAPS: usize = 10;

fn per_segment(counts: &std::collections::BTreeMap<Segment, usize>) -> String {
    counts
        .iter()
        .map(|(segment, count)| format!("{segment}={count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Key/value lines of the summary block.
pub fn summary_items(result: &ProcessingResult) -> Vec<(&'static str, String)> {
    let parse = &result.parse;
    let mut items = vec![
        ("Arquivo", result.questionnaire.source_file.clone()),
        ("Usuário", result.questionnaire.user.clone()),
        (
            "Perguntas",
            format!(
                "{} ({})",
                parse.questions.len(),
                per_segment(&parse.counts_by_segment())
            ),
        ),
        ("Seções", parse.sections.len().to_string()),
        (
            "Confiança",
            format!(
                "{:.0}% (mínimo {:.0}%)",
                parse.confidence * 100.0,
                parse.min_confidence * 100.0
            ),
        ),
    ];

    match &result.persisted {
        Some(summary) => {
            items.push((
                "Membros",
                format!(
                    "{} ({})",
                    summary.members,
                    per_segment(&summary.members_by_segment)
                ),
            ));
            items.push(("Respostas atribuídas", summary.assignments_written.to_string()));
            items.push((
                "Questionário",
                summary
                    .questionnaire_id
                    .as_ref()
                    .map_or_else(|| "não salvo".to_string(), |id| id.to_string()),
            ));
        }
        None => items.push(("Banco de dados", "não utilizado (--no-save)".to_string())),
    }
    items.push(("Status", result.questionnaire.status.as_str().to_string()));

    items
}

/// Parse-quality and persistence warnings, in display order.
pub fn warnings(result: &ProcessingResult) -> Vec<String> {
    let parse = &result.parse;
    let mut out = Vec::new();

    if parse.is_suspect() {
        out.push(format!(
            "Confiança baixa ({:.0}%): revise o PDF antes de usar as perguntas",
            parse.confidence * 100.0
        ));
    }
    if !parse.rejections.is_empty() {
        out.push(format!("{} candidatas descartadas", parse.rejections.len()));
        out.extend(
            parse
                .rejections
                .iter()
                .take(MAX_LISTED_REJECTIONS)
                .map(|r| format!("  {} #{}: {}", r.segment, r.number, r.reason)),
        );
    }

    let diagnostics = parse.diagnostics();
    for (segment, number) in &diagnostics.duplicates {
        out.push(format!("Pergunta repetida em {segment}: #{number}"));
    }
    for (segment, missing) in &diagnostics.missing_numbers {
        let mut list: Vec<String> = missing
            .iter()
            .take(MAX_LISTED_GAPS)
            .map(u32::to_string)
            .collect();
        if missing.len() > MAX_LISTED_GAPS {
            list.push(format!("... (+{})", missing.len() - MAX_LISTED_GAPS));
        }
        out.push(format!("Numeração incompleta em {segment}: faltam {}", list.join(", ")));
    }
    for (segment, max) in &diagnostics.out_of_range {
        out.push(format!("Numeração fora do esperado em {segment}: pergunta #{max}"));
    }

    if let Some(summary) = &result.persisted {
        for batch in summary.failures() {
            out.push(format!(
                "Lote {} de {} falhou ({} linhas): {}",
                batch.index,
                batch.stage,
                batch.rows,
                batch.error.as_deref().unwrap_or("erro desconhecido")
            ));
        }
    }

    out
}

/// Print the report to the console.
pub fn print_report(result: &ProcessingResult) {
    console::summary("Processamento do questionário", &summary_items(result));
    let warnings = warnings(result);
    if !warnings.is_empty() {
        console::separator();
        for warning in &warnings {
            console::warn(warning);
        }
    }
    if result.has_errors() {
        console::error("Processamento concluído com erros");
    } else {
        console::success("Processamento concluído");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParsingConfig, Questionnaire, QuestionnaireStatus, RecordId};
    use crate::parser::QuestionParser;
    use crate::pipeline::persist::{BatchOutcome, PersistSummary, Stage};

    fn result(text: &str, persisted: Option<PersistSummary>) -> ProcessingResult {
        let parse = QuestionParser::new(&ParsingConfig::default()).unwrap().parse(text);
        let mut questionnaire = Questionnaire::new("licao.pdf", "hash", "pastor@icm.com");
        questionnaire.total_questions = parse.questions.len();
        questionnaire.status = QuestionnaireStatus::Processed;
        ProcessingResult {
            questionnaire,
            parse,
            persisted,
        }
    }

    #[test]
    fn test_no_save_report_lists_counts() {
        let result = result("PARA TODOS\n1. A?\nR: a\nPARA CRIANÇAS\n1. B?\nR: b", None);
        let items = summary_items(&result);

        let questions = items.iter().find(|(k, _)| *k == "Perguntas").unwrap();
        assert_eq!(questions.1, "2 (todos=1, criancas=1, acessibilidade=0)");
        assert!(items.iter().any(|(k, _)| *k == "Banco de dados"));
        assert!(!items.iter().any(|(k, _)| *k == "Questionário"));
        assert!(warnings(&result).is_empty());
    }

    #[test]
    fn test_warnings_cover_quality_and_failed_batches() {
        let summary = PersistSummary {
            questionnaire_id: Some(RecordId::Int(1)),
            batches: vec![BatchOutcome {
                stage: Stage::Questions,
                index: 2,
                rows: 100,
                error: Some("timeout".into()),
            }],
            ..PersistSummary::default()
        };
        let result = result("1. A?\nR: a\n3. B?\nR: b\n4. C?", Some(summary));
        let warnings = warnings(&result);

        assert!(warnings[0].starts_with("Confiança baixa (67%)"));
        assert!(warnings.iter().any(|w| w == "1 candidatas descartadas"));
        assert!(warnings.iter().any(|w| w.contains("faltam 2")));
        assert_eq!(
            warnings.last().unwrap(),
            "Lote 2 de perguntas falhou (100 linhas): timeout"
        );
    }

    #[test]
    fn test_long_gap_lists_are_capped() {
        let result = result("1. A?\nR: a\n40. B?\nR: b", None);
        let warnings = warnings(&result);

        assert_eq!(
            warnings,
            vec![
                "Numeração incompleta em todos: faltam 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, ... (+28)"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_huge_ordinal_gets_a_single_warning() {
        let result = result("1. A?\nR: a\n300000000. B?\nR: b", None);
        let warnings = warnings(&result);

        assert_eq!(
            warnings,
            vec!["Numeração fora do esperado em todos: pergunta #300000000".to_string()]
        );
    }
}

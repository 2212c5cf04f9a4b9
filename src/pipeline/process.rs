// src/pipeline/process.rs

//! One PDF from bytes to persisted rows.

use std::path::Path;

use chrono::{Local, Utc};
use serde_json::json;

use crate::categorizer::MemberCategorizer;
use crate::error::Result;
use crate::extract::{TextExtractor, extract_text, read_pdf};
use crate::models::{Config, Questionnaire, QuestionnaireStatus, RecordId};
use crate::parser::{ParseOutcome, QuestionParser};
use crate::storage::{LogRow, QuestionnaireStore, ResultFile};
use crate::utils::{console, sha256_hex};

use super::persist::{PersistSummary, Persister};

/// Everything a run produced, for the report and the result file.
#[derive(Debug)]
pub struct ProcessingResult {
    pub questionnaire: Questionnaire,
    pub parse: ParseOutcome,
    /// `None` when saving was disabled
    pub persisted: Option<PersistSummary>,
}

impl ProcessingResult {
    pub fn questionnaire_id(&self) -> Option<&RecordId> {
        self.persisted.as_ref()?.questionnaire_id.as_ref()
    }

    pub fn member_count(&self) -> usize {
        self.persisted.as_ref().map_or(0, |p| p.members)
    }

    /// Saving was requested and failed somewhere.
    pub fn has_errors(&self) -> bool {
        self.questionnaire.status == QuestionnaireStatus::Error
    }

    pub fn result_file(&self) -> ResultFile {
        ResultFile {
            arquivo_processado: self.questionnaire.source_file.clone(),
            total_perguntas: self.questionnaire.total_questions,
            total_membros: self.member_count(),
            questionario_id: self.questionnaire_id().cloned(),
            timestamp: Local::now(),
            usuario: self.questionnaire.user.clone(),
            status: self.questionnaire.status.as_str().to_string(),
        }
    }
}

/// Reads, extracts, parses and (optionally) saves one PDF.
pub struct Processor<'a> {
    config: &'a Config,
    extractor: &'a dyn TextExtractor,
    parser: QuestionParser,
    categorizer: MemberCategorizer,
}

impl<'a> Processor<'a> {
    pub fn new(config: &'a Config, extractor: &'a dyn TextExtractor) -> Result<Self> {
        Ok(Self {
            config,
            extractor,
            parser: QuestionParser::new(&config.parsing)?,
            categorizer: MemberCategorizer::new(&config.categories),
        })
    }

    /// Process `pdf`. With `store == None` nothing touches the backend.
    pub async fn run(
        &self,
        pdf: &Path,
        user_email: &str,
        store: Option<&dyn QuestionnaireStore>,
    ) -> Result<ProcessingResult> {
        let total_steps = if store.is_some() { 4 } else { 3 };
        let name = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| pdf.display().to_string());

        console::step(1, total_steps, &format!("Lendo {}", pdf.display()));
        let bytes = read_pdf(pdf, self.config.runtime.max_pdf_size_mb).await?;
        let mut questionnaire = Questionnaire::new(name.as_str(), sha256_hex(&bytes), user_email);
        console::sub_item(&format!("{} bytes, sha256 {}", bytes.len(), questionnaire.file_hash));

        console::step(2, total_steps, "Extraindo texto");
        let text = extract_text(self.extractor, &name, &bytes)?;
        console::sub_item(&format!("{} caracteres extraídos", text.chars().count()));

        console::step(3, total_steps, "Identificando perguntas");
        let parse = self.parser.parse(&text);
        questionnaire.total_questions = parse.questions.len();
        questionnaire.confidence = parse.confidence;
        questionnaire.status = QuestionnaireStatus::Processed;
        console::sub_item(&format!(
            "{} perguntas aceitas de {} candidatas",
            parse.questions.len(),
            parse.candidate_count()
        ));

        let Some(store) = store else {
            console::info("Modo sem salvamento: banco de dados não utilizado");
            return Ok(ProcessingResult {
                questionnaire,
                parse,
                persisted: None,
            });
        };

        console::step(4, total_steps, "Salvando no banco de dados");
        let metadata = json!({
            "total_perguntas": parse.questions.len(),
            "total_candidatas": parse.candidate_count(),
            "total_secoes": parse.sections.len(),
            "tamanho_arquivo": bytes.len(),
        });
        let persister = Persister::new(store, &self.categorizer, self.config.backend.batch_size);
        let summary = persister
            .save(&questionnaire, &parse.questions, user_email, metadata)
            .await;

        questionnaire.status = if summary.is_success() {
            QuestionnaireStatus::Saved
        } else {
            QuestionnaireStatus::Error
        };
        self.log_run(store, &questionnaire, &summary).await;

        Ok(ProcessingResult {
            questionnaire,
            parse,
            persisted: Some(summary),
        })
    }

    async fn log_run(
        &self,
        store: &dyn QuestionnaireStore,
        questionnaire: &Questionnaire,
        summary: &PersistSummary,
    ) {
        let failures: Vec<String> = summary
            .failures()
            .map(|b| format!("{} lote {}: {}", b.stage, b.index, b.error.as_deref().unwrap_or("")))
            .collect();
        let row = LogRow {
            tipo_operacao: "processamento_pdf",
            usuario_id: summary.user.as_ref().map(|u| u.id.clone()),
            igreja_id: summary.user.as_ref().and_then(|u| u.igreja_id.clone()),
            detalhes: json!({
                "arquivo_nome": questionnaire.source_file,
                "questionario_id": summary.questionnaire_id,
                "total_perguntas": summary.questions_written,
                "total_membros": summary.members,
                "total_respostas": summary.assignments_written,
                "confianca": questionnaire.confidence,
                "falhas": failures,
            }),
            timestamp: Utc::now(),
            status: if summary.is_success() { "sucesso" } else { "erro" },
        };
        if let Err(e) = store.log_event(&row).await {
            console::warn(&format!("Falha ao registrar log do sistema: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{Member, UserProfile};
    use crate::pipeline::fake::MemoryStore;
    use std::path::PathBuf;

    const LESSON: &str = "IGREJA CRISTÃ MARANATA\nPARA TODOS\n1. Qual o nome?\nResposta: João\n\
                          PARA CRIANÇAS\n1. Quem criou o mundo?\nR: Deus";

    struct FixedText(&'static str);

    impl TextExtractor for FixedText {
        fn extract(&self, _name: &str, _bytes: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn pdf_in(dir: &Path) -> PathBuf {
        let path = dir.join("licao_01.pdf");
        std::fs::write(&path, b"%PDF-1.4 fake").unwrap();
        path
    }

    fn member(id: i64, grupo: &str) -> Member {
        Member {
            id: RecordId::Int(id),
            nome_completo: format!("Membro {id}"),
            email: None,
            grupo_assistencia: Some(grupo.into()),
            faixa_etaria: None,
            categoria: None,
            necessidades_especiais: None,
        }
    }

    #[tokio::test]
    async fn test_no_save_never_touches_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let extractor = FixedText(LESSON);
        let processor = Processor::new(&config, &extractor).unwrap();

        let result = processor
            .run(&pdf_in(dir.path()), "pastor@icm.com", None)
            .await
            .unwrap();

        assert_eq!(result.questionnaire.total_questions, 2);
        assert_eq!(result.questionnaire.status, QuestionnaireStatus::Processed);
        assert!(result.questionnaire_id().is_none());
        assert_eq!(result.member_count(), 0);
        assert!(result.result_file().questionario_id.is_none());
    }

    #[tokio::test]
    async fn test_full_run_saves_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let extractor = FixedText(LESSON);
        let store = MemoryStore::with_members(vec![member(1, "Adultos"), member(2, "Infantil")])
            .with_user(UserProfile {
                id: RecordId::Text("u-1".into()),
                email: Some("pastor@icm.com".into()),
                igreja_id: Some(RecordId::Int(3)),
            });
        let processor = Processor::new(&config, &extractor).unwrap();

        let result = processor
            .run(&pdf_in(dir.path()), "pastor@icm.com", Some(&store))
            .await
            .unwrap();

        assert_eq!(result.questionnaire.status, QuestionnaireStatus::Saved);
        assert!(!result.has_errors());
        assert_eq!(result.member_count(), 2);
        let summary = result.persisted.as_ref().unwrap();
        assert_eq!(summary.questions_written, 2);
        assert_eq!(summary.assignments_written, 2);
        assert_eq!(store.log_statuses(), vec!["sucesso"]);

        let file = result.result_file();
        assert_eq!(file.status, "salvo");
        assert_eq!(file.arquivo_processado, "licao_01.pdf");
        assert!(file.questionario_id.is_some());
    }

    #[tokio::test]
    async fn test_failed_batch_marks_run_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let extractor = FixedText(LESSON);
        let store = MemoryStore::with_members(vec![member(1, "Adultos")]).fail_question_batch(1);
        let processor = Processor::new(&config, &extractor).unwrap();

        let result = processor
            .run(&pdf_in(dir.path()), "pastor@icm.com", Some(&store))
            .await
            .unwrap();

        assert!(result.has_errors());
        assert_eq!(store.log_statuses(), vec!["erro"]);
    }

    #[tokio::test]
    async fn test_empty_text_stops_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let extractor = FixedText("   ");
        let store = MemoryStore::default();
        let processor = Processor::new(&config, &extractor).unwrap();

        let err = processor
            .run(&pdf_in(dir.path()), "pastor@icm.com", Some(&store))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Extraction { .. }));
        assert_eq!(store.calls(), 0);
    }
}

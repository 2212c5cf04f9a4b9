//! One command-line invocation after argument parsing: locate the PDF,
//! confirm, process, report and write the result file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::extract::{TextExtractor, find_pdf};
use crate::models::{Config, Environment};
use crate::storage::{QuestionnaireStore, write_result_file};
use crate::utils::console;

use super::process::{ProcessingResult, Processor};
use super::report::print_report;

/// What the operator asked for.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Explicit PDF; skips the folder search
    pub pdf: Option<PathBuf>,
    pub folder: PathBuf,
    pub user: String,
    pub environment: Environment,
}

/// Asks the operator whether to go on.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The search folder holds no PDF
    NoPdf { folder: PathBuf },
    /// The operator declined the confirmation prompt
    Cancelled,
    Finished {
        result: ProcessingResult,
        /// Written whenever the questionnaire row exists
        result_file: Option<PathBuf>,
    },
}

impl RunOutcome {
    /// 1 for a missing PDF or a failed save, 0 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::NoPdf { .. } => 1,
            RunOutcome::Cancelled => 0,
            RunOutcome::Finished { result, .. } => u8::from(result.has_errors()),
        }
    }
}

/// Explicit PDF wins, otherwise the first PDF of the search folder.
pub async fn resolve_pdf(request: &RunRequest) -> Result<Option<PathBuf>> {
    if let Some(pdf) = &request.pdf {
        return Ok(Some(pdf.clone()));
    }
    console::info(&format!("Buscando PDF em: {}", request.folder.display()));
    find_pdf(&request.folder).await
}

fn report_folder_without_pdf(folder: &Path) {
    console::error("PDF não encontrado!");
    console::sub_item(&format!(
        "Verifique se há arquivos PDF em: {}",
        folder.display()
    ));
}

/// Run one request. With `store == None` nothing touches the backend.
pub async fn execute(
    config: &Config,
    request: &RunRequest,
    extractor: &dyn TextExtractor,
    store: Option<&dyn QuestionnaireStore>,
    confirmation: &dyn Confirmation,
) -> Result<RunOutcome> {
    console::header("SISTEMA EBD - PROCESSAMENTO PDF");

    let Some(pdf) = resolve_pdf(request).await? else {
        report_folder_without_pdf(&request.folder);
        return Ok(RunOutcome::NoPdf {
            folder: request.folder.clone(),
        });
    };

    console::sub_item(&format!("PDF: {}", pdf.display()));
    console::sub_item(&format!("Usuário: {}", request.user));
    console::sub_item(&format!(
        "Salvar no banco: {}",
        if store.is_some() { "Sim" } else { "Não" }
    ));
    console::sub_item(&format!("Ambiente: {}", request.environment));

    if request.environment.requires_confirmation()
        && !confirmation.confirm("Continuar com o processamento?").await?
    {
        console::warn("Processamento cancelado pelo usuário");
        return Ok(RunOutcome::Cancelled);
    }

    let processor = Processor::new(config, extractor)?;
    let result = processor.run(&pdf, &request.user, store).await?;
    print_report(&result);

    let result_file = match result.questionnaire_id() {
        Some(_) => {
            let path = write_result_file(&config.folders.results, &result.result_file()).await?;
            console::success(&format!("Resultado salvo em: {}", path.display()));
            Some(path)
        }
        None => None,
    };

    Ok(RunOutcome::Finished {
        result,
        result_file,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::models::{Member, RecordId};
    use crate::pipeline::fake::MemoryStore;

    const LESSON: &str = "PARA TODOS\n1. Qual o nome?\nResposta: João\n\
                          PARA CRIANÇAS (de 4 a 8 anos de idade)\n\
                          1. Quem criou o mundo?\nR: Deus";

    #[derive(Default)]
    struct CountingExtractor {
        calls: AtomicUsize,
    }

    impl TextExtractor for CountingExtractor {
        fn extract(&self, _name: &str, _bytes: &[u8]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LESSON.to_string())
        }
    }

    struct Answer(bool);

    #[async_trait]
    impl Confirmation for Answer {
        async fn confirm(&self, _prompt: &str) -> Result<bool> {
            Ok(self.0)
        }
    }

    struct Workspace {
        _dir: tempfile::TempDir,
        folder: PathBuf,
        config: Config,
    }

    fn workspace(pdfs: &[&str]) -> Workspace {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("entrada");
        std::fs::create_dir(&folder).unwrap();
        for name in pdfs {
            std::fs::write(folder.join(name), b"%PDF-1.4 fake").unwrap();
        }
        let mut config = Config::default();
        config.folders.results = dir.path().join("resultados");
        Workspace {
            _dir: dir,
            folder,
            config,
        }
    }

    fn request(ws: &Workspace, environment: Environment) -> RunRequest {
        RunRequest {
            pdf: None,
            folder: ws.folder.clone(),
            user: "pastor@icm.com".into(),
            environment,
        }
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
    async fn test_folder_without_pdf_exits_1_before_extraction() {
        let ws = workspace(&[]);
        std::fs::write(ws.folder.join("notas.txt"), b"x").unwrap();
        let extractor = CountingExtractor::default();
        let store = MemoryStore::default();

        let outcome = execute(
            &ws.config,
            &request(&ws, Environment::Desenvolvimento),
            &extractor,
            Some(&store),
            &Answer(true),
        )
        .await
        .unwrap();

        assert!(matches!(&outcome, RunOutcome::NoPdf { folder } if *folder == ws.folder));
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_declined_confirmation_exits_0_without_processing() {
        let ws = workspace(&["licao.pdf"]);
        let extractor = CountingExtractor::default();

        let outcome = execute(
            &ws.config,
            &request(&ws, Environment::Producao),
            &extractor,
            None,
            &Answer(false),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::Cancelled));
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_save_writes_no_result_file() {
        let ws = workspace(&["licao.pdf"]);
        let extractor = CountingExtractor::default();

        let outcome = execute(
            &ws.config,
            &request(&ws, Environment::Producao),
            &extractor,
            None,
            &Answer(true),
        )
        .await
        .unwrap();

        let RunOutcome::Finished {
            result,
            result_file,
        } = &outcome
        else {
            panic!("expected a finished run, got {outcome:?}");
        };
        assert_eq!(result.questionnaire.total_questions, 2);
        assert!(result_file.is_none());
        assert!(!ws.config.folders.results.exists());
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_save_exits_1_and_still_writes_result_file() {
        let ws = workspace(&["licao.pdf"]);
        let extractor = CountingExtractor::default();
        let store = MemoryStore::with_members(vec![member(1, "Adultos")]).fail_question_batch(1);

        let outcome = execute(
            &ws.config,
            &request(&ws, Environment::Teste),
            &extractor,
            Some(&store),
            &Answer(true),
        )
        .await
        .unwrap();

        let RunOutcome::Finished { result_file, .. } = &outcome else {
            panic!("expected a finished run, got {outcome:?}");
        };
        let path = result_file.as_ref().unwrap();
        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(written["status"], "erro");
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_explicit_pdf_skips_folder_search() {
        let ws = workspace(&[]);
        let pdf = ws.folder.join("outra.pdf");
        std::fs::write(&pdf, b"%PDF-1.4 fake").unwrap();
        let request = RunRequest {
            pdf: Some(pdf.clone()),
            folder: ws.folder.join("inexistente"),
            ..request(&ws, Environment::Desenvolvimento)
        };

        assert_eq!(resolve_pdf(&request).await.unwrap(), Some(pdf));
    }
}

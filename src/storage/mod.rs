//! Persistence for processed questionnaires.
//!
//! The backend is a hosted PostgREST database. Writes happen in this order:
//!
//! ```text
//! questionarios_pdf      1 row per PDF (upsert on hash_arquivo)
//! perguntas_extraidas    N rows, batched (upsert on questionnaire, segment,
//!                        section and number)
//! respostas_membros      1 row per (question, member) pair, batched
//! logs_sistema           1 row per run
//! ```
//!
//! Every upsert key needs a matching unique constraint in the database, so
//! re-importing the same PDF updates rows instead of duplicating them.
//!
//! The local result file lives in [`local`].

pub mod local;
pub mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::models::{
    AnswerOption, Member, Question, QuestionKind, Questionnaire, RecordId, Segment, UserProfile,
};

pub use local::{ResultFile, write_result_file};
pub use supabase::SupabaseStore;

/// Conflict columns of the questionnaire upsert.
pub const QUESTIONNAIRE_KEY: &str = "hash_arquivo";
/// Conflict columns of the question upsert.
pub const QUESTION_KEY: &str = "questionario_id,segmento,secao,numero_pergunta";
/// Conflict columns of the assignment upsert.
pub const ASSIGNMENT_KEY: &str = "pergunta_id,membro_id";

/// Row written to the questionnaire table.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionnaireRow {
    pub arquivo_nome: String,
    pub hash_arquivo: String,
    pub data_processamento: DateTime<Utc>,
    pub total_perguntas: usize,
    pub confianca: f64,
    pub status: &'static str,
    pub usuario_id: Option<RecordId>,
    pub igreja_id: Option<RecordId>,
    pub metadados: Value,
}

impl QuestionnaireRow {
    pub fn new(questionnaire: &Questionnaire, user: Option<&UserProfile>, metadata: Value) -> Self {
        Self {
            arquivo_nome: questionnaire.source_file.clone(),
            hash_arquivo: questionnaire.file_hash.clone(),
            data_processamento: questionnaire.processed_at,
            total_perguntas: questionnaire.total_questions,
            confianca: questionnaire.confidence,
            status: questionnaire.status.as_str(),
            usuario_id: user.map(|u| u.id.clone()),
            igreja_id: user.and_then(|u| u.igreja_id.clone()),
            metadados: metadata,
        }
    }
}

/// Row written to the question table.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionRow {
    pub questionario_id: RecordId,
    pub numero_pergunta: u32,
    pub segmento: Segment,
    pub secao: String,
    pub texto_pergunta: String,
    pub texto_resposta: String,
    pub tipo_pergunta: QuestionKind,
    pub opcoes_resposta: Vec<AnswerOption>,
}

impl QuestionRow {
    pub fn new(questionnaire_id: &RecordId, question: &Question) -> Self {
        Self {
            questionario_id: questionnaire_id.clone(),
            numero_pergunta: question.number,
            segmento: question.segment,
            secao: question.section.clone(),
            texto_pergunta: question.text.clone(),
            texto_resposta: question.answer.clone(),
            tipo_pergunta: question.kind,
            opcoes_resposta: question.options.clone(),
        }
    }
}

/// "Member is expected to answer question" row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRow {
    pub questionario_id: RecordId,
    pub pergunta_id: RecordId,
    pub membro_id: RecordId,
    pub segmento: Segment,
    pub status: &'static str,
}

/// Operation log entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogRow {
    pub tipo_operacao: &'static str,
    pub usuario_id: Option<RecordId>,
    pub igreja_id: Option<RecordId>,
    pub detalhes: Value,
    pub timestamp: DateTime<Utc>,
    pub status: &'static str,
}

/// Backend operations needed by one processing run.
#[async_trait]
pub trait QuestionnaireStore: Send + Sync {
    /// Look up the acting user by e-mail.
    async fn find_user(&self, email: &str) -> Result<Option<UserProfile>>;

    /// Members, optionally restricted to one church.
    async fn fetch_members(&self, church: Option<&RecordId>) -> Result<Vec<Member>>;

    /// Upsert the questionnaire row and return its id.
    async fn insert_questionnaire(&self, row: &QuestionnaireRow) -> Result<RecordId>;

    /// Upsert one batch of questions on [`QUESTION_KEY`]; ids come back in
    /// input order.
    async fn insert_questions(&self, rows: &[QuestionRow]) -> Result<Vec<RecordId>>;

    /// Upsert one batch of assignments; returns the number written.
    async fn insert_assignments(&self, rows: &[AssignmentRow]) -> Result<usize>;

    async fn log_event(&self, row: &LogRow) -> Result<()>;
}

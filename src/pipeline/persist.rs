// src/pipeline/persist.rs

//! Batched writes of one questionnaire, its questions and assignments.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde_json::Value;

use crate::categorizer::{MemberCategorizer, segment_counts};
use crate::models::{Member, Question, Questionnaire, RecordId, Segment, UserProfile};
use crate::storage::{AssignmentRow, QuestionRow, QuestionnaireRow, QuestionnaireStore};
use crate::utils::console;

/// Which write a batch outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Members,
    Questionnaire,
    Questions,
    Assignments,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Members => "membros",
            Stage::Questionnaire => "questionário",
            Stage::Questions => "perguntas",
            Stage::Assignments => "respostas",
        })
    }
}

/// Result of one network call.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub stage: Stage,
    /// 1-based batch number within the stage
    pub index: usize,
    pub rows: usize,
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// What a save attempt wrote.
#[derive(Debug, Clone, Default)]
pub struct PersistSummary {
    pub questionnaire_id: Option<RecordId>,
    pub user: Option<UserProfile>,
    pub members: usize,
    pub members_by_segment: BTreeMap<Segment, usize>,
    pub questions_written: usize,
    pub assignments_written: usize,
    pub batches: Vec<BatchOutcome>,
}

impl PersistSummary {
    pub fn failures(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches.iter().filter(|b| !b.is_ok())
    }

    pub fn is_success(&self) -> bool {
        self.questionnaire_id.is_some() && self.failures().next().is_none()
    }

    fn record(&mut self, stage: Stage, index: usize, rows: usize, error: Option<String>) {
        if let Some(message) = &error {
            console::error(&format!("Falha no lote {index} de {stage} ({rows} linhas): {message}"));
        }
        self.batches.push(BatchOutcome {
            stage,
            index,
            rows,
            error,
        });
    }
}

/// Assignment rows for every (question, member) pair whose segments match,
/// in question creation order, then member order.
pub fn build_assignments(
    questionnaire_id: &RecordId,
    saved: &[(RecordId, &Question)],
    members: &[Member],
    segments: &BTreeMap<RecordId, BTreeSet<Segment>>,
) -> Vec<AssignmentRow> {
    saved
        .iter()
        .flat_map(|(question_id, question)| {
            members
                .iter()
                .filter(|m| segments.get(&m.id).is_some_and(|s| s.contains(&question.segment)))
                .map(|m| AssignmentRow {
                    questionario_id: questionnaire_id.clone(),
                    pergunta_id: question_id.clone(),
                    membro_id: m.id.clone(),
                    segmento: question.segment,
                    status: "pendente",
                })
        })
        .collect()
}

/// Questions with a distinct upsert key, first occurrence kept.
fn unique_questions(questions: &[Question]) -> Vec<&Question> {
    let mut seen = HashSet::new();
    questions
        .iter()
        .filter(|q| seen.insert((q.segment, q.section.as_str(), q.number)))
        .collect()
}

/// Writes one processing run to a [`QuestionnaireStore`].
pub struct Persister<'a> {
    store: &'a dyn QuestionnaireStore,
    categorizer: &'a MemberCategorizer,
    batch_size: usize,
}

impl<'a> Persister<'a> {
    pub fn new(
        store: &'a dyn QuestionnaireStore,
        categorizer: &'a MemberCategorizer,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            categorizer,
            batch_size: batch_size.max(1),
        }
    }

    /// Attempt every write. Failed batches are recorded and never stop the
    /// remaining ones; only a failed questionnaire row skips its dependents.
    pub async fn save(
        &self,
        questionnaire: &Questionnaire,
        questions: &[Question],
        user_email: &str,
        metadata: Value,
    ) -> PersistSummary {
        let mut summary = PersistSummary::default();

        summary.user = match self.store.find_user(user_email).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                console::warn(&format!("Usuário não encontrado: {user_email}"));
                None
            }
            Err(e) => {
                console::warn(&format!("Falha ao buscar usuário {user_email}: {e}"));
                None
            }
        };
        let church = summary.user.as_ref().and_then(|u| u.igreja_id.as_ref());

        let members = match self.store.fetch_members(church).await {
            Ok(members) => {
                summary.record(Stage::Members, 1, members.len(), None);
                members
            }
            Err(e) => {
                summary.record(Stage::Members, 1, 0, Some(e.to_string()));
                Vec::new()
            }
        };
        let segments = self.categorizer.categorize_all(&members);
        summary.members = members.len();
        summary.members_by_segment = segment_counts(segments.values());
        console::sub_item(&format!("{} membros categorizados", members.len()));

        let row = QuestionnaireRow::new(questionnaire, summary.user.as_ref(), metadata);
        let questionnaire_id = match self.store.insert_questionnaire(&row).await {
            Ok(id) => {
                summary.record(Stage::Questionnaire, 1, 1, None);
                id
            }
            Err(e) => {
                summary.record(Stage::Questionnaire, 1, 1, Some(e.to_string()));
                return summary;
            }
        };
        summary.questionnaire_id = Some(questionnaire_id.clone());
        console::sub_item(&format!("Questionário salvo (id {questionnaire_id})"));

        let unique = unique_questions(questions);
        if unique.len() < questions.len() {
            console::warn(&format!(
                "{} perguntas repetidas (mesmo segmento, seção e número) não serão salvas",
                questions.len() - unique.len()
            ));
        }

        let mut saved: Vec<(RecordId, &Question)> = Vec::with_capacity(unique.len());
        for (i, chunk) in unique.chunks(self.batch_size).enumerate() {
            let rows: Vec<QuestionRow> = chunk
                .iter()
                .map(|q| QuestionRow::new(&questionnaire_id, q))
                .collect();
            match self.store.insert_questions(&rows).await {
                Ok(ids) => {
                    summary.questions_written += ids.len();
                    saved.extend(ids.into_iter().zip(chunk.iter().copied()));
                    summary.record(Stage::Questions, i + 1, rows.len(), None);
                }
                Err(e) => summary.record(Stage::Questions, i + 1, rows.len(), Some(e.to_string())),
            }
        }
        console::sub_item(&format!("{} perguntas salvas", summary.questions_written));

        let assignments = build_assignments(&questionnaire_id, &saved, &members, &segments);
        for (i, chunk) in assignments.chunks(self.batch_size).enumerate() {
            match self.store.insert_assignments(chunk).await {
                Ok(written) => {
                    summary.assignments_written += written;
                    summary.record(Stage::Assignments, i + 1, chunk.len(), None);
                }
                Err(e) => {
                    summary.record(Stage::Assignments, i + 1, chunk.len(), Some(e.to_string()))
                }
            }
        }
        console::sub_item(&format!(
            "{} respostas atribuídas",
            summary.assignments_written
        ));

        summary
    }
}

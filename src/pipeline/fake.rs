//! In-memory store for pipeline tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Member, RecordId, Segment, UserProfile};
use crate::storage::{AssignmentRow, LogRow, QuestionRow, QuestionnaireRow, QuestionnaireStore};

#[derive(Default)]
struct State {
    calls: usize,
    next_id: i64,
    question_batches: Vec<usize>,
    assignment_batches: Vec<usize>,
    logs: Vec<&'static str>,
    /// Rows keyed like the backend's unique constraints
    questionnaires: BTreeMap<String, RecordId>,
    questions: BTreeMap<(RecordId, Segment, String, u32), RecordId>,
    assignments: BTreeSet<(RecordId, RecordId)>,
}

#[derive(Default)]
pub struct MemoryStore {
    members: Vec<Member>,
    user: Option<UserProfile>,
    fail_questionnaire: bool,
    fail_question_batch: Option<usize>,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn with_members(members: Vec<Member>) -> Self {
        Self {
            members,
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user: UserProfile) -> Self {
        self.user = Some(user);
        self
    }

    pub fn fail_questionnaire(mut self) -> Self {
        self.fail_questionnaire = true;
        self
    }

    /// Fail the n-th (1-based) question batch.
    pub fn fail_question_batch(mut self, n: usize) -> Self {
        self.fail_question_batch = Some(n);
        self
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn question_batch_sizes(&self) -> Vec<usize> {
        self.state.lock().unwrap().question_batches.clone()
    }

    pub fn assignment_batch_sizes(&self) -> Vec<usize> {
        self.state.lock().unwrap().assignment_batches.clone()
    }

    pub fn log_statuses(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().logs.clone()
    }

    pub fn stored_questionnaires(&self) -> usize {
        self.state.lock().unwrap().questionnaires.len()
    }

    pub fn stored_questions(&self) -> usize {
        self.state.lock().unwrap().questions.len()
    }

    pub fn stored_assignments(&self) -> usize {
        self.state.lock().unwrap().assignments.len()
    }

    fn next_id(state: &mut State) -> RecordId {
        state.next_id += 1;
        RecordId::Int(state.next_id)
    }
}

#[async_trait]
impl QuestionnaireStore for MemoryStore {
    async fn find_user(&self, email: &str) -> Result<Option<UserProfile>> {
        self.state.lock().unwrap().calls += 1;
        Ok(self
            .user
            .clone()
            .filter(|u| u.email.as_deref() == Some(email)))
    }

    async fn fetch_members(&self, _church: Option<&RecordId>) -> Result<Vec<Member>> {
        self.state.lock().unwrap().calls += 1;
        Ok(self.members.clone())
    }

    async fn insert_questionnaire(&self, row: &QuestionnaireRow) -> Result<RecordId> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if self.fail_questionnaire {
            return Err(AppError::backend("questionarios_pdf", 500, "boom"));
        }
        if let Some(id) = state.questionnaires.get(&row.hash_arquivo) {
            return Ok(id.clone());
        }
        let id = Self::next_id(&mut state);
        state.questionnaires.insert(row.hash_arquivo.clone(), id.clone());
        Ok(id)
    }

    async fn insert_questions(&self, rows: &[QuestionRow]) -> Result<Vec<RecordId>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.question_batches.push(rows.len());
        if self.fail_question_batch == Some(state.question_batches.len()) {
            return Err(AppError::backend("perguntas_extraidas", 503, "unavailable"));
        }
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let key = (
                row.questionario_id.clone(),
                row.segmento,
                row.secao.clone(),
                row.numero_pergunta,
            );
            let id = match state.questions.get(&key).cloned() {
                Some(id) => id,
                None => {
                    let id = Self::next_id(&mut state);
                    state.questions.insert(key, id.clone());
                    id
                }
            };
            ids.push(id);
        }
        Ok(ids)
    }

    async fn insert_assignments(&self, rows: &[AssignmentRow]) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.assignment_batches.push(rows.len());
        for row in rows {
            state
                .assignments
                .insert((row.pergunta_id.clone(), row.membro_id.clone()));
        }
        Ok(rows.len())
    }

    async fn log_event(&self, row: &LogRow) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.logs.push(row.status);
        Ok(())
    }
}

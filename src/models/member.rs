//! Membership records as read from the backend.

use serde::{Deserialize, Serialize};

use super::RecordId;

/// A church member. Read-only from this crate's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: RecordId,

    #[serde(default)]
    pub nome_completo: String,

    #[serde(default)]
    pub email: Option<String>,

    /// Assistance group, e.g. "Grupo 4 - Crianças"
    #[serde(default)]
    pub grupo_assistencia: Option<String>,

    /// Free-text age bracket
    #[serde(default)]
    pub faixa_etaria: Option<String>,

    #[serde(default)]
    pub categoria: Option<String>,

    /// Free-text special-needs note
    #[serde(default)]
    pub necessidades_especiais: Option<String>,
}

impl Member {
    /// All descriptor fields joined for keyword matching.
    pub fn descriptor_text(&self) -> String {
        [
            &self.grupo_assistencia,
            &self.faixa_etaria,
            &self.categoria,
            &self.necessidades_especiais,
        ]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Row from the `usuarios` table describing who runs an import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: RecordId,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub igreja_id: Option<RecordId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_text_skips_empty_fields() {
        let member: Member = serde_json::from_value(serde_json::json!({
            "id": 7,
            "nome_completo": "Ana",
            "grupo_assistencia": "Grupo 4 - Crianças",
            "faixa_etaria": "  ",
            "necessidades_especiais": "baixa visão"
        }))
        .unwrap();

        assert_eq!(member.descriptor_text(), "Grupo 4 - Crianças baixa visão");
    }

    #[test]
    fn test_member_tolerates_missing_fields() {
        let member: Member = serde_json::from_str(r#"{"id":"uuid-1"}"#).unwrap();
        assert_eq!(member.descriptor_text(), "");
        assert_eq!(member.id, RecordId::Text("uuid-1".into()));
    }
}

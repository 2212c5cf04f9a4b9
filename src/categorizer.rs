//! Member to segment assignment by keyword matching.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{CategoryConfig, Member, RecordId, Segment};

/// Assigns members to the segments whose questions they should answer.
#[derive(Debug, Clone)]
pub struct MemberCategorizer {
    /// Lowercased keywords per segment
    rules: Vec<(Segment, Vec<String>)>,
}

impl MemberCategorizer {
    pub fn new(config: &CategoryConfig) -> Self {
        let rules = config
            .rules
            .iter()
            .map(|rule| {
                let keywords = rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (rule.segment, keywords)
            })
            .collect();
        Self { rules }
    }

    /// Segments for one member. Never empty: falls back to `todos`.
    pub fn categorize(&self, member: &Member) -> BTreeSet<Segment> {
        let descriptor = member.descriptor_text().to_lowercase();

        let mut segments: BTreeSet<Segment> = self
            .rules
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| descriptor.contains(k.as_str())))
            .map(|(segment, _)| *segment)
            .collect();

        if segments.is_empty() {
            segments.insert(Segment::Todos);
        }
        segments
    }

    /// Categorize every member, keyed by member id.
    pub fn categorize_all(&self, members: &[Member]) -> BTreeMap<RecordId, BTreeSet<Segment>> {
        members
            .iter()
            .map(|m| (m.id.clone(), self.categorize(m)))
            .collect()
    }
}

/// Members per segment, for the final report.
pub fn segment_counts<'a, I>(assignments: I) -> BTreeMap<Segment, usize>
where
    I: IntoIterator<Item = &'a BTreeSet<Segment>>,
{
    let mut counts: BTreeMap<Segment, usize> = Segment::ALL.iter().map(|s| (*s, 0)).collect();
    for segments in assignments {
        for segment in segments {
            *counts.entry(*segment).or_default() += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64, grupo: Option<&str>, necessidades: Option<&str>) -> Member {
        Member {
            id: RecordId::Int(id),
            nome_completo: format!("Membro {id}"),
            email: None,
            grupo_assistencia: grupo.map(String::from),
            faixa_etaria: None,
            categoria: None,
            necessidades_especiais: necessidades.map(String::from),
        }
    }

    fn categorizer() -> MemberCategorizer {
        MemberCategorizer::new(&CategoryConfig::default())
    }

    #[test]
    fn test_member_without_descriptors_is_todos() {
        let segments = categorizer().categorize(&member(1, None, None));
        assert_eq!(segments, BTreeSet::from([Segment::Todos]));
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let segments = categorizer().categorize(&member(2, Some("Grupo 4 - CRIANÇAS"), None));
        assert_eq!(segments, BTreeSet::from([Segment::Criancas]));
    }

    #[test]
    fn test_member_may_belong_to_two_segments() {
        let segments = categorizer().categorize(&member(
            3,
            Some("Adolescentes"),
            Some("Necessita material adaptado"),
        ));
        assert_eq!(
            segments,
            BTreeSet::from([Segment::Criancas, Segment::Acessibilidade])
        );
    }

    #[test]
    fn test_output_is_never_empty() {
        let categorizer = MemberCategorizer::new(&CategoryConfig { rules: Vec::new() });
        for m in [member(1, Some("Adultos"), None), member(2, Some("Infantil"), None)] {
            assert!(!categorizer.categorize(&m).is_empty());
        }
    }

    #[test]
    fn test_segment_counts() {
        let categorizer = categorizer();
        let members = vec![
            member(1, None, None),
            member(2, Some("juvenil"), None),
            member(3, Some("juvenil"), Some("deficiência auditiva")),
        ];
        let assignments = categorizer.categorize_all(&members);
        let counts = segment_counts(assignments.values());

        assert_eq!(counts[&Segment::Todos], 1);
        assert_eq!(counts[&Segment::Criancas], 2);
        assert_eq!(counts[&Segment::Acessibilidade], 1);
    }
}

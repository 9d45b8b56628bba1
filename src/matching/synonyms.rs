//! Reverse lookup from every known alias to its canonical id.

use std::collections::HashMap;
use tracing::debug;

use super::normalize::normalize_token;
use crate::models::taxonomy::TaxonomyEntity;

/// A registered alias, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymEntry {
    /// Normalized alias.
    pub token: String,
    /// Canonical id it resolves to.
    pub id: String,
}

/// Exact-match alias index over normalized tokens.
///
/// Registration order is the priority order: when two entities claim the
/// same token, the one registered first keeps it.
#[derive(Debug, Clone, Default)]
pub struct SynonymIndex {
    ids: Vec<String>,
    lookup: HashMap<String, usize>,
    entries: Vec<SynonymEntry>,
}

impl SynonymIndex {
    /// Builds the index from an ordered id list, a label per id and
    /// additional synonyms per id. Each id registers itself, its label and
    /// then its synonyms.
    pub fn build(
        ids: &[String],
        labels: &HashMap<String, String>,
        synonyms: &HashMap<String, Vec<String>>,
    ) -> Self {
        let mut index = Self::default();
        for id in ids {
            index.ids.push(id.clone());
            index.register(id, id);
            if let Some(label) = labels.get(id) {
                index.register(label, id);
            }
            for alias in synonyms.get(id).into_iter().flatten() {
                index.register(alias, id);
            }
        }
        index
    }

    /// Builds the index from taxonomy entities, keeping their order.
    pub fn from_entities(entities: &[TaxonomyEntity]) -> Self {
        let ids: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
        let labels = entities
            .iter()
            .map(|e| (e.id.clone(), e.label.clone()))
            .collect();
        let synonyms = entities
            .iter()
            .map(|e| (e.id.clone(), e.synonyms.clone()))
            .collect();
        Self::build(&ids, &labels, &synonyms)
    }

    fn register(&mut self, alias: &str, id: &str) {
        let token = normalize_token(alias);
        if token.is_empty() {
            return;
        }
        if let Some(&existing) = self.lookup.get(&token) {
            let owner = &self.entries[existing].id;
            if owner != id {
                debug!(
                    token = %token,
                    kept = %owner,
                    ignored = %id,
                    "Synonym collision, keeping earlier registration"
                );
            }
            return;
        }
        self.lookup.insert(token.clone(), self.entries.len());
        self.entries.push(SynonymEntry {
            token,
            id: id.to_string(),
        });
    }

    /// Canonical id for a raw segment, exact match on the normalized token.
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        let token = normalize_token(raw);
        self.lookup
            .get(&token)
            .map(|&i| self.entries[i].id.as_str())
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    /// Canonical ids in registration order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Every registered alias in registration order.
    pub fn entries(&self) -> &[SynonymEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

use serde::Serialize;
use std::collections::BTreeMap;

/// All occurrences of one entity type, in the order the service listed them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityGroup {
    name: String,
    values: Vec<String>,
    scores: Vec<f64>,
}

impl EntityGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            scores: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, value: impl Into<String>, score: f64) {
        self.values.push(value.into());
        self.scores.push(score);
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// `scores()[i]` belongs to `values()[i]`.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(String::as_str).zip(self.scores.iter().copied())
    }

    /// Values joined with a single space, rebuilding a phrase the service
    /// split into several tokens.
    pub fn full_value(&self) -> String {
        self.values.join(" ")
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentResult {
    pub intent: String,
    /// Confidence in `intent` (0.0–1.0).
    pub intent_score: f64,
    pub entities: BTreeMap<String, EntityGroup>,
}

impl IntentResult {
    pub fn new(intent: impl Into<String>, intent_score: f64) -> Self {
        Self {
            intent: intent.into(),
            intent_score,
            entities: BTreeMap::new(),
        }
    }

    pub fn entity(&self, name: &str) -> Option<&EntityGroup> {
        self.entities.get(name)
    }

    /// Append to the group for `name`, creating it on first sight.
    pub fn add_entity(&mut self, name: &str, value: impl Into<String>, score: f64) {
        self.entities
            .entry(name.to_string())
            .or_insert_with(|| EntityGroup::new(name))
            .push(value, score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_keeps_values_and_scores_parallel() {
        let mut g = EntityGroup::new("Subject1");
        g.push("ocr", 0.8);
        g.push("some text", 0.6);
        assert_eq!(g.len(), g.scores().len());
        assert_eq!(g.iter().collect::<Vec<_>>(), vec![("ocr", 0.8), ("some text", 0.6)]);
        assert_eq!(g.full_value(), "ocr some text");
    }

    #[test]
    fn empty_group_has_empty_full_value() {
        let g = EntityGroup::new("x");
        assert!(g.is_empty());
        assert_eq!(g.full_value(), "");
    }

    #[test]
    fn add_entity_groups_by_name() {
        let mut r = IntentResult::new("Mordor", 0.9);
        r.add_entity("Subject1", "one", 0.5);
        r.add_entity("Subject2", "two", 0.4);
        r.add_entity("Subject1", "three", 0.3);
        assert_eq!(r.entities.len(), 2);
        assert_eq!(r.entity("Subject1").unwrap().values(), &["one", "three"]);
        assert_eq!(r.entity("Subject1").unwrap().name(), "Subject1");
        assert!(r.entity("Subject3").is_none());
    }
}

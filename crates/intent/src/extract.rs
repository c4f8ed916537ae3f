use serde::Deserialize;
use sightline_core::{parse_json, ServiceError};

use crate::types::IntentResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LuisResponse {
    top_scoring_intent: TopScoringIntent,
    // Absent when nothing in the utterance matched an entity.
    #[serde(default)]
    entities: Vec<EntityRecord>,
}

#[derive(Debug, Deserialize)]
struct TopScoringIntent {
    intent: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct EntityRecord {
    #[serde(rename = "type")]
    kind: String,
    entity: String,
    score: f64,
}

/// Transcribe an intent/entity response: the service's top intent as-is, and
/// entities grouped by type in response order. No thresholding or merging.
pub fn extract_result(body: &[u8]) -> Result<IntentResult, ServiceError> {
    parse_response(body, "intent response")
}

pub(crate) fn parse_response(body: &[u8], context: &str) -> Result<IntentResult, ServiceError> {
    let response: LuisResponse = parse_json(body, context)?;

    let mut result = IntentResult::new(response.top_scoring_intent.intent, response.top_scoring_intent.score);
    for record in response.entities {
        result.add_entity(&record.kind, record.entity, record.score);
    }
    Ok(result)
}

//! The generation constraint handed to the model when classifying.

use serde_json::{json, Map, Value};

use crate::types::Confidence;

/// Parameter keys the classifier may extract, with their descriptions.
pub const PARAMETER_PROPERTIES: [(&str, &str); 3] = [
    ("topic_name", "Name of the topic"),
    ("topic_description", "Description of the topic"),
    ("arxiv_url", "ArXiv URL or ID"),
];

/// Object schema requiring `intent` (enum of `intents`, deduplicated in
/// order), `parameters` and `confidence`.
pub fn build_schema(intents: &[String]) -> Value {
    let mut unique: Vec<&str> = Vec::with_capacity(intents.len());
    for name in intents {
        if !unique.contains(&name.as_str()) {
            unique.push(name.as_str());
        }
    }

    let properties: Map<String, Value> = PARAMETER_PROPERTIES
        .iter()
        .map(|(key, description)| {
            (
                key.to_string(),
                json!({"type": "string", "description": description}),
            )
        })
        .collect();

    let confidence: Vec<&str> = Confidence::ALL.iter().map(Confidence::as_str).collect();

    json!({
        "type": "object",
        "properties": {
            "intent": {
                "type": "string",
                "enum": unique,
                "description": "The user's primary intent"
            },
            "parameters": {
                "type": "object",
                "properties": properties,
                "description": "Parameters extracted from user input"
            },
            "confidence": {
                "type": "string",
                "enum": confidence,
                "description": "Confidence in intent classification"
            }
        },
        "required": ["intent", "parameters", "confidence"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_enum_deduplicates_in_order() {
        let names: Vec<String> = ["list_topics", "add_topic", "list_topics", "help"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let schema = build_schema(&names);
        assert_eq!(
            schema["properties"]["intent"]["enum"],
            json!(["list_topics", "add_topic", "help"])
        );
        assert_eq!(
            schema["required"],
            json!(["intent", "parameters", "confidence"])
        );
    }

    #[test]
    fn test_parameter_and_confidence_shapes() {
        let schema = build_schema(&[]);
        let params = &schema["properties"]["parameters"]["properties"];
        assert_eq!(params["arxiv_url"]["type"], "string");
        assert_eq!(params["topic_description"]["description"], "Description of the topic");
        assert!(schema["properties"]["parameters"].get("required").is_none());
        assert_eq!(
            schema["properties"]["confidence"]["enum"],
            json!(["high", "medium", "low"])
        );
    }
}

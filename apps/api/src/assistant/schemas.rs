//! Response schemas declared to the endpoint for structured flows.

use serde_json::{json, Value};

pub fn fit_analysis() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "fitScore": { "type": "INTEGER", "description": "A score from 0-100" },
            "summary": { "type": "STRING", "description": "A one-sentence summary" },
            "pros": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of matching qualifications"
            },
            "cons": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of potential gaps"
            }
        },
        "required": ["fitScore", "summary", "pros", "cons"]
    })
}

pub fn interview_questions() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "questions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": {
                            "type": "STRING",
                            "description": "Behavioral, Technical or Role-specific"
                        },
                        "question": { "type": "STRING" },
                        "tip": { "type": "STRING", "description": "How to approach the answer" }
                    },
                    "required": ["type", "question", "tip"]
                }
            }
        },
        "required": ["questions"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_schema_requires_every_field() {
        let schema = fit_analysis();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, ["fitScore", "summary", "pros", "cons"]);
    }

    #[test]
    fn test_interview_schema_items_are_objects() {
        let schema = interview_questions();
        assert_eq!(schema["properties"]["questions"]["items"]["type"], "OBJECT");
    }
}

//! JSON Schemas handed to [`evalforge_llm::call_structured`] so every
//! structured call in the pipeline enforces the declared shapes at the
//! provider boundary rather than via free-text parsing.

use serde_json::{Value, json};

fn evidence_schema() -> Value {
    json!({
        "type": "object",
        "required": ["input_file", "line_start", "line_end", "quote"],
        "properties": {
            "input_file": { "type": "string" },
            "line_start": { "type": "integer", "minimum": 1 },
            "line_end": { "type": "integer", "minimum": 1 },
            "quote": { "type": "string", "minLength": 1 }
        }
    })
}

/// Schema for the use-case extractor's response.
#[must_use]
pub fn use_cases_response_schema() -> Value {
    json!({
        "type": "object",
        "required": ["use_cases"],
        "properties": {
            "use_cases": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "name", "description", "evidence"],
                    "properties": {
                        "id": { "type": "string", "pattern": "^uc_" },
                        "name": { "type": "string", "minLength": 1 },
                        "description": { "type": "string", "minLength": 1 },
                        "evidence": {
                            "type": "array",
                            "minItems": 1,
                            "items": evidence_schema()
                        }
                    }
                }
            }
        }
    })
}

/// Schema for the policy extractor's response.
#[must_use]
pub fn policies_response_schema() -> Value {
    json!({
        "type": "object",
        "required": ["policies"],
        "properties": {
            "policies": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "type", "description", "evidence"],
                    "properties": {
                        "id": { "type": "string", "pattern": "^pol_" },
                        "type": {
                            "type": "string",
                            "enum": ["must", "must_not", "escalate", "style", "format"]
                        },
                        "statement": { "type": "string" },
                        "description": { "type": "string", "minLength": 1 },
                        "evidence": {
                            "type": "array",
                            "minItems": 1,
                            "items": evidence_schema()
                        }
                    }
                }
            }
        }
    })
}

/// Schema for the case/format detector's response.
#[must_use]
pub fn detection_response_schema() -> Value {
    json!({
        "type": "object",
        "required": ["case", "formats", "reasoning"],
        "properties": {
            "case": {
                "type": "string",
                "enum": ["support_bot", "operator_quality", "doctor_booking"]
            },
            "formats": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "string",
                    "enum": [
                        "single_turn_qa",
                        "single_utterance_correction",
                        "dialog_last_turn_correction"
                    ]
                }
            },
            "reasoning": { "type": "string" }
        }
    })
}

/// Schema for a format adapter's generation response. The adapter
/// layer fills in `case`/`format`/ids itself; the model only needs to
/// supply conversational content.
#[must_use]
pub fn dataset_example_response_schema() -> Value {
    json!({
        "type": "object",
        "required": ["messages", "expected_output", "evaluation_criteria", "policy_ids"],
        "properties": {
            "messages": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["role", "content"],
                    "properties": {
                        "role": {
                            "type": "string",
                            "enum": ["user", "operator", "assistant", "system"]
                        },
                        "content": { "type": "string", "minLength": 1 }
                    }
                }
            },
            "expected_output": { "type": "string", "minLength": 1 },
            "evaluation_criteria": {
                "type": "array",
                "minItems": 3,
                "items": { "type": "string", "minLength": 1 }
            },
            "policy_ids": {
                "type": "array",
                "minItems": 1,
                "items": { "type": "string", "pattern": "^pol_" }
            }
        }
    })
}

/// Schema for the support-bot source classifier's LLM fallback path.
#[must_use]
pub fn source_classification_response_schema() -> Value {
    json!({
        "type": "object",
        "required": ["source", "confidence"],
        "properties": {
            "source": {
                "type": "string",
                "enum": ["tickets", "faq_paraphrase", "corner"]
            },
            "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
        }
    })
}

/// Schema for the orchestrator's direct structured-LLM fallback: a batch of
/// complete dataset examples produced in one call when every other path
/// fell short.
#[must_use]
pub fn fallback_examples_response_schema() -> Value {
    json!({
        "type": "object",
        "required": ["examples"],
        "properties": {
            "examples": {
                "type": "array",
                "items": dataset_example_response_schema()
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonschema::Validator;

    #[test]
    fn all_schemas_are_themselves_valid_json_schema() {
        for schema in [
            use_cases_response_schema,
            policies_response_schema,
            detection_response_schema,
            dataset_example_response_schema,
            source_classification_response_schema,
            fallback_examples_response_schema,
        ] {
            Validator::new(&schema).unwrap_or_else(|e| panic!("invalid schema {schema}: {e}"));
        }
    }
}

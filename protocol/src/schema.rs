//! JSON schema contracts sent to the generative service.
//!
//! In schema-constrained mode the schema rides in the `response_format`
//! directive; in free-form mode it is embedded verbatim in the system
//! message as authoritative instructions. Either way the same object is
//! the single source of truth for structural validation.

use serde_json::{json, Value};
use std::marker::PhantomData;

/// A named schema paired with the Rust type the validated payload
/// deserializes into.
pub struct SchemaContract<T> {
    pub name: &'static str,
    pub schema: Value,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SchemaContract<T> {
    pub fn new(name: &'static str, schema: Value) -> Self {
        Self {
            name,
            schema,
            _marker: PhantomData,
        }
    }
}

pub fn intent_plan_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "intent": { "type": "string", "enum": ["explanatory", "action", "analytical"] },
            "audience": { "type": "string", "maxLength": 100 },
            "tone": {
                "type": "string",
                "enum": ["professional", "casual", "enthusiastic", "authoritative"]
            },
            "slidePattern": {
                "type": "string",
                "enum": ["bulleted-list", "title-only", "split-chart", "comparison", "timeline"]
            },
            "visualPlan": { "type": "string", "enum": ["text-only", "chart", "image", "mixed"] },
            "brandHints": { "type": "array", "items": { "type": "string" }, "maxItems": 5 },
            "dataHints": { "type": "array", "items": { "type": "string" }, "maxItems": 10 }
        },
        "required": ["intent", "tone", "slidePattern", "visualPlan"]
    })
}

pub fn slide_spec_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "meta": {
                "type": "object",
                "properties": {
                    "version": { "type": "string" },
                    "locale": { "type": "string" },
                    "theme": { "type": "string" },
                    "aspectRatio": { "type": "string", "enum": ["16:9", "4:3"] }
                }
            },
            "content": {
                "type": "object",
                "properties": {
                    "title": text_block_schema(),
                    "subtitle": text_block_schema(),
                    "bullets": {
                        "type": "array",
                        "maxItems": 3,
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "heading": { "type": "string" },
                                "items": {
                                    "type": "array",
                                    "maxItems": 6,
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "text": { "type": "string", "maxLength": 80 },
                                            "level": { "type": "integer", "minimum": 1, "maximum": 3 }
                                        },
                                        "required": ["text"]
                                    }
                                }
                            },
                            "required": ["items"]
                        }
                    },
                    "callouts": {
                        "type": "array",
                        "maxItems": 4,
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "variant": {
                                    "type": "string",
                                    "enum": ["note", "success", "warning", "danger"]
                                },
                                "text": { "type": "string" }
                            },
                            "required": ["text"]
                        }
                    },
                    "dataViz": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "kind": { "type": "string", "enum": ["bar", "line", "pie", "area"] },
                            "labels": {
                                "type": "array",
                                "minItems": 2,
                                "maxItems": 12,
                                "items": { "type": "string" }
                            },
                            "series": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "name": { "type": "string" },
                                        "values": { "type": "array", "items": { "type": "number" } }
                                    },
                                    "required": ["values"]
                                }
                            },
                            "valueFormat": {
                                "type": "string",
                                "enum": ["number", "percent", "currency"]
                            }
                        },
                        "required": ["labels", "series"]
                    },
                    "imagePlaceholders": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "kind": { "type": "string" },
                                "description": { "type": "string" }
                            }
                        }
                    }
                },
                "required": ["title"]
            },
            "layout": {
                "type": "object",
                "properties": {
                    "grid": {
                        "type": "object",
                        "properties": {
                            "columns": { "type": "integer" },
                            "rows": { "type": "integer" },
                            "gutter": { "type": "integer" },
                            "margin": { "type": "integer" }
                        }
                    },
                    "regions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string" },
                                "row": { "type": "integer" },
                                "col": { "type": "integer" },
                                "rowSpan": { "type": "integer" },
                                "colSpan": { "type": "integer" }
                            },
                            "required": ["name"]
                        }
                    },
                    "anchors": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "contentId": { "type": "string" },
                                "region": { "type": "string" },
                                "order": { "type": "integer" }
                            },
                            "required": ["contentId", "region"]
                        }
                    }
                }
            },
            "styleTokens": {
                "type": "object",
                "properties": {
                    "palette": {
                        "type": "object",
                        "properties": {
                            "primary": { "type": "string" },
                            "accent": { "type": "string" },
                            "neutral": { "type": "array", "items": { "type": "string" } }
                        }
                    }
                }
            }
        },
        "required": ["content"]
    })
}

fn text_block_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string" },
            "text": { "type": "string" }
        },
        "required": ["text"]
    })
}

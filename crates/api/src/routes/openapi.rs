//! Static OpenAPI document describing the public endpoints.
//!
//! Only the `/api/v1` tree is listed; `/api/latest` and the unversioned
//! aliases serve identical operations.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Map, Value};

use crate::config::ApiInfo;
use crate::state::AppState;

pub const OPENAPI_PATH: &str = "/openapi.json";

/// GET /openapi.json
async fn openapi_document(State(state): State<AppState>) -> Json<Value> {
    Json(document(&state.config.api))
}

pub fn router() -> Router<AppState> {
    Router::new().route(OPENAPI_PATH, get(openapi_document))
}

/// Build the OpenAPI 3.1 document for the configured API metadata.
pub fn document(api: &ApiInfo) -> Value {
    let mut info = Map::new();
    info.insert("title".into(), json!(api.title));
    info.insert("description".into(), json!(api.description));
    info.insert("version".into(), json!(api.version));
    info.insert("summary".into(), json!(api.summary));
    if !api.contact.is_empty() {
        info.insert("contact".into(), Value::Object(api.contact.clone()));
    }
    if !api.license_info.is_empty() {
        info.insert("license".into(), Value::Object(api.license_info.clone()));
    }

    json!({
        "openapi": "3.1.0",
        "info": info,
        "paths": {
            "/api/health": {
                "get": {
                    "summary": "Health check",
                    "operationId": "health_check",
                    "responses": {
                        "200": json_response("Service is up", "HealthResponse"),
                    }
                }
            },
            "/api/v1/agent/": {
                "post": {
                    "summary": "Send a message to the agent",
                    "operationId": "send_message",
                    "parameters": [query_param("message", "User message")],
                    "responses": {
                        "200": json_response("Model reply", "AgentResponse"),
                        "422": json_response("Missing or blank message", "ErrorResponse"),
                        "500": json_response("Model call failed", "ErrorResponse"),
                    }
                }
            },
            "/api/v1/article-agent/": {
                "post": {
                    "summary": "Generate an article",
                    "operationId": "generate_article",
                    "parameters": [query_param("article_name", "Article title")],
                    "responses": {
                        "200": json_response("Generated article", "Article"),
                        "422": json_response("Missing or blank title", "ErrorResponse"),
                        "500": json_response("Generation failed", "ErrorResponse"),
                    }
                }
            },
            "/metrics": {
                "get": {
                    "summary": "Prometheus metrics",
                    "operationId": "render_metrics",
                    "responses": {
                        "200": {
                            "description": "Text exposition format",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "HealthResponse": object_schema(&[("status", "string"), ("version", "string")]),
                "AgentResponse": object_schema(&[("message", "string")]),
                "Article": object_schema(&[("summary", "string"), ("article", "string")]),
                "ErrorResponse": object_schema(&[("detail", "string"), ("code", "string")]),
            }
        }
    })
}

fn query_param(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": true,
        "description": description,
        "schema": { "type": "string" }
    })
}

fn json_response(description: &str, schema: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn object_schema(fields: &[(&str, &str)]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|(name, ty)| (name.to_string(), json!({ "type": ty })))
        .collect();
    let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_info() -> ApiInfo {
        ApiInfo {
            title: "Test API".into(),
            description: "Testing".into(),
            version: "1.2.3".into(),
            summary: "Summary".into(),
            contact: Map::new(),
            license_info: Map::new(),
        }
    }

    #[test]
    fn info_carries_configured_metadata() {
        let doc = document(&api_info());

        assert_eq!(doc["openapi"], "3.1.0");
        assert_eq!(doc["info"]["title"], "Test API");
        assert_eq!(doc["info"]["version"], "1.2.3");
        assert!(doc["info"].get("contact").is_none());
    }

    #[test]
    fn contact_and_license_are_included_when_set() {
        let mut api = api_info();
        api.contact.insert("name".into(), json!("Alice"));
        api.license_info.insert("name".into(), json!("MIT"));

        let doc = document(&api);

        assert_eq!(doc["info"]["contact"]["name"], "Alice");
        assert_eq!(doc["info"]["license"]["name"], "MIT");
    }

    #[test]
    fn agent_operations_require_their_query_parameter() {
        let doc = document(&api_info());

        let agent = &doc["paths"]["/api/v1/agent/"]["post"]["parameters"][0];
        assert_eq!(agent["name"], "message");
        assert_eq!(agent["required"], true);

        let article = &doc["paths"]["/api/v1/article-agent/"]["post"]["parameters"][0];
        assert_eq!(article["name"], "article_name");
    }
}

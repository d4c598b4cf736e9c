//! Spec loading through the HTTP API against a mock spec host.

use serde_json::{json, Value};

mod common;

use common::{spawn_app, MockResponse, MockUpstream};

fn petstore() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {"title": "Petstore", "version": 2, "description": "Pets"},
        "servers": [{"url": "https://pets.test/v1"}],
        "paths": {
            "/pets": {
                "parameters": [{"name": "X-Tenant", "in": "header", "schema": {"type": "string"}}],
                "get": {
                    "operationId": "listPets",
                    "tags": ["pets"],
                    "parameters": [{"$ref": "#/components/parameters/Limit"}]
                },
                "post": {
                    "requestBody": {
                        "required": true,
                        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}
                    }
                }
            },
            "/pets/{id}": {
                "delete": {"parameters": [{"name": "id", "in": "path", "required": true}]}
            }
        },
        "components": {
            "parameters": {
                "Limit": {"name": "limit", "in": "query", "schema": {"type": "integer"}}
            },
            "schemas": {"Pet": {"type": "object", "properties": {"name": {"type": "string"}}}}
        }
    })
}

const PETSTORE_YAML: &str = r#"
openapi: 3.0.0
info:
  title: Petstore
  version: 2
  description: Pets
servers:
  - url: https://pets.test/v1
paths:
  /pets:
    parameters:
      - name: X-Tenant
        in: header
        schema:
          type: string
    get:
      operationId: listPets
      tags: [pets]
      parameters:
        - $ref: '#/components/parameters/Limit'
    post:
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
  /pets/{id}:
    delete:
      parameters:
        - name: id
          in: path
          required: true
components:
  parameters:
    Limit:
      name: limit
      in: query
      schema:
        type: integer
  schemas:
    Pet:
      type: object
      properties:
        name:
          type: string
"#;

#[tokio::test]
async fn test_load_json_spec() {
    let upstream = MockUpstream::start().await;
    upstream.respond("/openapi.json", MockResponse::json(petstore()));
    let app = spawn_app().await;

    let (status, spec) = app
        .post("/api/spec/load", json!({"url": upstream.url("/openapi.json")}))
        .await;
    assert_eq!(status, 200, "{spec}");
    assert_eq!(spec["title"], "Petstore");
    assert_eq!(spec["version"], "2");
    assert_eq!(spec["base_url"], "https://pets.test/v1");
    assert_eq!(spec["source_url"], upstream.url("/openapi.json"));

    let endpoints = spec["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 3);

    let list = &endpoints[0];
    assert_eq!(list["method"], "GET");
    assert_eq!(list["path"], "/pets");
    assert_eq!(list["operation_id"], "listPets");
    let params = list["parameters"].as_array().unwrap();
    assert_eq!(params.len(), 2);
    assert_eq!(params[0]["name"], "X-Tenant");
    assert_eq!(params[1]["name"], "limit");
    assert_eq!(params[1]["location"], "query");
    assert_eq!(params[1]["schema"], json!({"type": "integer"}));

    let create = &endpoints[1];
    assert_eq!(create["method"], "POST");
    assert_eq!(create["has_request_body"], true);
    assert_eq!(create["request_body_required"], true);
    assert_eq!(create["request_body_schema"]["type"], "object");

    let (status, current) = app.get("/api/spec").await;
    assert_eq!(status, 200);
    assert_eq!(current["title"], "Petstore");
}

#[tokio::test]
async fn test_json_and_yaml_give_same_catalog() {
    let upstream = MockUpstream::start().await;
    upstream.respond("/openapi.json", MockResponse::json(petstore()));
    upstream.respond("/openapi.yaml", MockResponse::yaml(PETSTORE_YAML));
    let app = spawn_app().await;

    let (status, from_json) = app
        .post("/api/spec/load", json!({"url": upstream.url("/openapi.json")}))
        .await;
    assert_eq!(status, 200, "{from_json}");
    let (status, from_yaml) = app
        .post("/api/spec/load", json!({"url": upstream.url("/openapi.yaml")}))
        .await;
    assert_eq!(status, 200, "{from_yaml}");

    assert_eq!(from_json["endpoints"], from_yaml["endpoints"]);
    assert_eq!(from_json["base_url"], from_yaml["base_url"]);
}

#[tokio::test]
async fn test_root_fetch_failure_keeps_previous_spec() {
    let upstream = MockUpstream::start().await;
    upstream.respond("/good.json", MockResponse::json(petstore()));
    upstream.respond("/broken.json", MockResponse::text(500, "boom"));
    let app = spawn_app().await;

    let (status, _) = app
        .post("/api/spec/load", json!({"url": upstream.url("/good.json")}))
        .await;
    assert_eq!(status, 200);

    let (status, body) = app
        .post("/api/spec/load", json!({"url": upstream.url("/broken.json")}))
        .await;
    assert_eq!(status, 502);
    assert!(body["detail"].as_str().unwrap().contains("500"));

    let (_, current) = app.get("/api/spec").await;
    assert_eq!(current["source_url"], upstream.url("/good.json"));
}

#[tokio::test]
async fn test_missing_openapi_key_is_unprocessable() {
    let upstream = MockUpstream::start().await;
    upstream.respond("/plain.json", MockResponse::json(json!({"paths": {}})));
    upstream.respond("/list.json", MockResponse::json(json!([1, 2, 3])));
    let app = spawn_app().await;

    let (status, body) = app
        .post("/api/spec/load", json!({"url": upstream.url("/plain.json")}))
        .await;
    assert_eq!(status, 422);
    assert!(body["detail"].is_string());

    let (status, _) = app
        .post("/api/spec/load", json!({"url": upstream.url("/list.json")}))
        .await;
    assert_eq!(status, 422);

    let (_, current) = app.get("/api/spec").await;
    assert_eq!(current, json!({"loaded": false}));
}

#[tokio::test]
async fn test_external_refs_are_inlined() {
    let upstream = MockUpstream::start().await;
    upstream.respond(
        "/specs/root.json",
        MockResponse::json(json!({
            "openapi": "3.0.0",
            "info": {"title": "Split", "version": "1"},
            "paths": {
                "/x": {"$ref": "doc.yaml"},
                "/y": {"$ref": "doc.yaml"}
            }
        })),
    );
    upstream.respond(
        "/specs/doc.yaml",
        MockResponse::yaml(
            "get:\n  operationId: getX\n  parameters:\n    - $ref: params/limit.json\n",
        ),
    );
    upstream.respond(
        "/specs/params/limit.json",
        MockResponse::json(json!({
            "name": "limit", "in": "query", "required": true, "schema": {"type": "integer"}
        })),
    );
    let app = spawn_app().await;

    let (status, spec) = app
        .post("/api/spec/load", json!({"url": upstream.url("/specs/root.json")}))
        .await;
    assert_eq!(status, 200, "{spec}");

    let endpoints = spec["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 2);
    let x = &endpoints[0];
    assert_eq!(x["method"], "GET");
    assert_eq!(x["path"], "/x");
    assert_eq!(
        x["parameters"],
        json!([{
            "name": "limit",
            "location": "query",
            "required": true,
            "description": null,
            "schema": {"type": "integer"}
        }])
    );

    assert!(!spec["raw"]["paths"]["/x"].to_string().contains("$ref"));
    assert_eq!(upstream.hits("/specs/doc.yaml"), 1);
    assert_eq!(upstream.hits("/specs/params/limit.json"), 1);
}

#[tokio::test]
async fn test_failed_external_ref_does_not_fail_load() {
    let upstream = MockUpstream::start().await;
    upstream.respond(
        "/root.json",
        MockResponse::json(json!({
            "openapi": "3.0.0",
            "paths": {
                "/gone": {"$ref": "missing.json"},
                "/here": {"get": {}}
            }
        })),
    );
    let app = spawn_app().await;

    let (status, spec) = app
        .post("/api/spec/load", json!({"url": upstream.url("/root.json")}))
        .await;
    assert_eq!(status, 200, "{spec}");
    assert_eq!(spec["title"], "Untitled");
    assert_eq!(spec["version"], "unknown");

    let endpoints = spec["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0]["path"], "/here");
}

#[tokio::test]
async fn test_root_fetch_sends_environment_auth() {
    let upstream = MockUpstream::start().await;
    upstream.respond("/private.json", MockResponse::json(petstore()));
    let app = spawn_app().await;
    let env_id = app
        .create_env(
            &upstream.base_url(),
            json!({"type": "api_key", "token": "k-1", "header_name": "X-Spec-Key"}),
        )
        .await;

    let (status, _) = app
        .post(
            "/api/spec/load",
            json!({"url": upstream.url("/private.json"), "environment_id": env_id}),
        )
        .await;
    assert_eq!(status, 200);

    let requests = upstream.requests();
    assert_eq!(requests[0].header("x-spec-key"), Some("k-1"));
}

#[tokio::test]
async fn test_unknown_environment_is_not_found() {
    let upstream = MockUpstream::start().await;
    upstream.respond("/openapi.json", MockResponse::json(petstore()));
    let app = spawn_app().await;

    let (status, body) = app
        .post(
            "/api/spec/load",
            json!({"url": upstream.url("/openapi.json"), "environment_id": "nope"}),
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["detail"], "Environment not found: nope");
    assert_eq!(upstream.hits("/openapi.json"), 0);
}

#[tokio::test]
async fn test_clear_spec() {
    let upstream = MockUpstream::start().await;
    upstream.respond("/openapi.json", MockResponse::json(petstore()));
    let app = spawn_app().await;

    app.post("/api/spec/load", json!({"url": upstream.url("/openapi.json")}))
        .await;
    let (status, body) = app.delete("/api/spec").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"cleared": true}));

    let (_, current) = app.get("/api/spec").await;
    assert_eq!(current, json!({"loaded": false}));
}

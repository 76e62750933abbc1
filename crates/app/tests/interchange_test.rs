//! Import/export integration tests.
//!
//! These exercise the full `text → detect → validate → convert` pipeline and
//! the exporters against documents shaped like the ones other tools write.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use pretty_assertions::assert_eq;
use probe_domain::collection::{Collection, Folder};
use probe_domain::export::ExportFormat;
use probe_domain::format::SpecFormat;
use probe_domain::request::{ApiRequest, BodyType, HttpMethod, KeyValuePair};
use probe_domain::testing::{Assertion, StatusExpectation};
use probe_infrastructure::{
    ImportError, export_collections, import_collections, parse_document, validate_openapi,
};

const POSTMAN: &str = r#"{
  "info": {
    "_postman_id": "pm-1",
    "name": "Store",
    "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
  },
  "item": [
    {
      "name": "Orders",
      "item": [
        {
          "name": "List orders",
          "request": {
            "method": "GET",
            "header": [{"key": "Accept", "value": "application/json"}],
            "url": {
              "raw": "{{base}}/orders?status=open",
              "host": ["{{base}}"],
              "path": ["orders"],
              "query": [
                {"key": "status", "value": "open"},
                {"key": "debug", "value": "1", "disabled": true}
              ]
            }
          }
        }
      ]
    },
    {
      "name": "Health",
      "request": {"method": "GET", "url": "{{base}}/health"}
    }
  ]
}"#;

const INSOMNIA: &str = r#"{
  "_type": "export",
  "__export_format": 4,
  "resources": [
    {"_id": "req_2", "_type": "request", "parentId": "fld_1", "name": "Create user",
     "method": "POST", "url": "{{ _.base }}/users",
     "body": {"mimeType": "application/json", "text": "{\"name\": \"{{ _.user }}\"}"},
     "headers": [{"name": "X-Trace", "value": "1"}]},
    {"_id": "wrk_1", "_type": "workspace", "name": "Users API"},
    {"_id": "fld_1", "_type": "request_group", "parentId": "wrk_1", "name": "Users"},
    {"_id": "env_1", "_type": "environment", "parentId": "wrk_1", "name": "Base"},
    {"_id": "req_1", "_type": "request", "parentId": "wrk_1", "name": "Ping",
     "method": "GET", "url": "{{ _.base }}/ping"}
  ]
}"#;

const SWAGGER: &str = r##"
swagger: "2.0"
info:
  title: Pets
  version: "1.0"
host: pets.example.com
basePath: /v1
schemes: [https]
paths:
  /pets/{petId}:
    parameters:
      - name: petId
        in: path
        required: true
        type: string
    get:
      summary: Get pet
      parameters:
        - name: expand
          in: query
          type: string
          default: owner
      responses:
        "200":
          description: ok
  /pets:
    post:
      operationId: createPet
      consumes: [application/json]
      parameters:
        - name: body
          in: body
          schema:
            $ref: "#/definitions/Pet"
      responses:
        "201":
          description: created
definitions:
  Pet:
    type: object
    properties:
      name:
        type: string
      age:
        type: integer
"##;

fn sample_collection() -> Collection {
    let mut collection = Collection::new("Sample")
        .with_request(
            ApiRequest::get("Root", "{{base}}/")
                .with_param(KeyValuePair::disabled("trace", "1"))
                .with_test(Assertion::StatusCode {
                    expected: StatusExpectation::Range { min: 200, max: 299 },
                }),
        )
        .with_folder(
            Folder::new("Accounts")
                .with_request(
                    ApiRequest::new("Login", HttpMethod::Post, "{{base}}/login").with_form_data(
                        vec![
                            KeyValuePair::new("user", "{{user}}"),
                            KeyValuePair::disabled("otp", ""),
                        ],
                    ),
                )
                .with_folder(Folder::new("Admin").with_request(
                    ApiRequest::new("Audit", HttpMethod::Put, "{{base}}/audit")
                        .with_header(KeyValuePair::new("Content-Type", "application/xml"))
                        .with_body(BodyType::Xml, "<audit/>"),
                )),
        );
    collection.description = Some("Everything at once".to_string());
    collection
}

#[test]
fn test_native_round_trip_is_identity() {
    let original = vec![sample_collection(), Collection::new("Empty")];

    let text = export_collections(&original, ExportFormat::Native).unwrap();
    let outcome = import_collections(&text).unwrap();

    assert_eq!(outcome.format, SpecFormat::Native);
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.collections, original);
}

#[test]
fn test_native_export_is_stable() {
    let collections = vec![sample_collection()];
    let first = export_collections(&collections, ExportFormat::Native).unwrap();
    let again = export_collections(
        &import_collections(&first).unwrap().collections,
        ExportFormat::Native,
    )
    .unwrap();
    assert_eq!(first, again);
}

#[test]
fn test_validator_is_deterministic() {
    let document = parse_document(SWAGGER).unwrap();
    let first = validate_openapi(&document);
    for _ in 0..5 {
        assert_eq!(validate_openapi(&document), first);
    }
}

#[test]
fn test_postman_import() {
    let outcome = import_collections(POSTMAN).unwrap();
    assert_eq!(outcome.format, SpecFormat::Postman);

    let collection = &outcome.collections[0];
    assert_eq!(collection.id, "pm-1");
    assert_eq!(collection.name, "Store");
    assert_eq!(collection.requests[0].name, "Health");
    assert_eq!(collection.requests[0].url, "{{base}}/health");

    let list = &collection.folders[0].requests[0];
    assert_eq!(collection.folders[0].name, "Orders");
    assert_eq!(list.url, "{{base}}/orders");
    assert_eq!(
        list.params,
        vec![
            KeyValuePair::new("status", "open"),
            KeyValuePair::disabled("debug", "1")
        ]
    );
}

#[test]
fn test_postman_through_native_and_back() {
    let imported = import_collections(POSTMAN).unwrap().collections;
    let exported = export_collections(&imported, ExportFormat::Postman).unwrap();

    assert!(!exported.contains("debug"));
    let reimported = import_collections(&exported).unwrap().collections;
    assert_eq!(reimported[0].request_count(), imported[0].request_count());
    assert_eq!(
        reimported[0].folders[0].requests[0].params,
        vec![KeyValuePair::new("status", "open")]
    );
}

#[test]
fn test_insomnia_import_rebuilds_tree() {
    let outcome = import_collections(INSOMNIA).unwrap();
    assert_eq!(outcome.format, SpecFormat::Insomnia);

    let collection = &outcome.collections[0];
    assert_eq!(collection.name, "Users API");
    assert_eq!(collection.requests[0].name, "Ping");
    assert_eq!(collection.requests[0].url, "{{base}}/ping");

    let users = &collection.folders[0];
    assert_eq!(users.name, "Users");
    let create = &users.requests[0];
    assert_eq!(create.method, HttpMethod::Post);
    assert_eq!(create.url, "{{base}}/users");
    assert_eq!(create.body_type, BodyType::Json);
    assert_eq!(create.body, r#"{"name": "{{user}}"}"#);
    assert_eq!(create.headers, vec![KeyValuePair::new("X-Trace", "1")]);
}

#[test]
fn test_swagger_yaml_import() {
    let outcome = import_collections(SWAGGER).unwrap();
    assert_eq!(outcome.format, SpecFormat::Swagger);

    let collection = &outcome.collections[0];
    assert_eq!(collection.name, "Pets");
    let pets = &collection.folders[0];
    assert_eq!(pets.name, "pets");

    let get = pets.requests.iter().find(|r| r.method == HttpMethod::Get).unwrap();
    assert_eq!(get.url, "https://pets.example.com/v1/pets/{{petId}}");
    assert_eq!(get.params, vec![KeyValuePair::new("expand", "owner")]);

    let create = pets.requests.iter().find(|r| r.method == HttpMethod::Post).unwrap();
    assert_eq!(create.name, "createPet");
    assert_eq!(create.body_type, BodyType::Json);
    let body: serde_json::Value = serde_json::from_str(&create.body).unwrap();
    assert_eq!(body, serde_json::json!({"name": "", "age": 0}));
}

#[test]
fn test_openapi_errors_reject_import() {
    let text = r#"{"openapi": "3.0.0", "swagger": "2.0", "info": {"title": "Both"}, "paths": {}}"#;
    let Err(ImportError::Validation(findings)) = import_collections(text) else {
        panic!("expected validation failure");
    };
    assert!(findings.iter().any(|f| f.path == "$" && f.is_error()));
}

#[test]
fn test_openapi_export_round_trips_requests() {
    let collection = Collection::new("Catalog")
        .with_request(ApiRequest::get("List items", "https://shop.test/items").with_param(KeyValuePair::new("page", "1")))
        .with_request(ApiRequest::get("Get item", "https://shop.test/items/{{itemId}}"));

    for format in [ExportFormat::OpenApiJson, ExportFormat::OpenApiYaml] {
        let text = export_collections(std::slice::from_ref(&collection), format).unwrap();
        let outcome = import_collections(&text).unwrap();
        assert_eq!(outcome.format, SpecFormat::OpenApi);

        let items = &outcome.collections[0].folders[0];
        let urls: Vec<&str> = items.requests.iter().map(|r| r.url.as_str()).collect();
        assert!(urls.contains(&"https://shop.test/items"));
        assert!(urls.contains(&"https://shop.test/items/{{itemId}}"));

        let list = items.requests.iter().find(|r| r.name == "List items").unwrap();
        assert_eq!(list.params, vec![KeyValuePair::new("page", "1")]);
    }
}

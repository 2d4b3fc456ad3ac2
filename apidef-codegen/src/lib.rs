//! apidef Codegen — resource schemas to protobuf and OpenAPI
//!
//! This library reads a declarative resource schema (YAML or JSON) and emits
//! two artefacts describing the same API:
//!
//! - **Protobuf IDL** — a proto3 source file with one service, resource
//!   messages, and aep-style request/response messages (see
//!   [`generate_proto`])
//! - **OpenAPI document** — a 3.1 JSON document with one path item per
//!   resource URL and `$ref`-shared component schemas (see
//!   [`generate_openapi_json`])
//!
//! Generation is deterministic: the same schema always produces
//! byte-identical artefacts.
//!
//! # Usage
//!
//! ```rust
//! use apidef_codegen::{generate_openapi_json, generate_proto, resolve, validate, Service};
//!
//! let yaml = r#"
//! name: bookstore.example.com
//! url: http://localhost:8081
//! resources:
//!   - kind: book
//!     plural: books
//!     properties:
//!       title:
//!         type: string
//!         number: 1
//!         required: true
//!     methods:
//!       create: {}
//!       get: {}
//!       list: {}
//! "#;
//!
//! let service = Service::from_yaml(yaml).unwrap();
//!
//! let errors = validate(&service);
//! assert!(errors.iter().all(|e| e.severity != validate::Severity::Error));
//!
//! let resolved = resolve(&service).unwrap();
//!
//! let proto = generate_proto(&resolved).unwrap();
//! assert!(proto.contains("service Bookstore {"));
//!
//! let openapi = generate_openapi_json(&resolved).unwrap();
//! assert!(openapi.contains("\"openapi\": \"3.1.0\""));
//! ```

pub mod error;
pub mod openapi;
pub mod proto;
pub mod resolve;
pub mod schema;
pub mod validate;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use error::{CodegenError, CodegenResult};
pub use openapi::{generate_openapi, generate_openapi_json, OpenApiDocument};
pub use proto::generate_proto;
pub use resolve::{resolve, ResolvedResource, ResolvedService, ResourceId};
pub use schema::{
    to_pascal_case, to_snake_case, CreateMethod, CustomMethod, CustomVerb, ListMethod, Methods,
    Property, PropertyType, Resource, SchemaDef, Service,
};
pub use validate::{is_valid, validate, Severity, ValidationError};

//! OpenAPI document generation
//!
//! Walks the resolved graph and builds an OpenAPI 3.1 document: one
//! component schema per resource and shared object type (reused via `$ref`),
//! one path item per collection/item URL with the enabled operations, and an
//! `x-aep-resource` extension describing resource identity and hierarchy for
//! downstream tooling.
//!
//! Every map in the document model is a `BTreeMap` so serialization order is
//! fixed and regeneration is byte-identical.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{CodegenError, CodegenResult};
use crate::resolve::{ResolvedService, ResourceId};
use crate::schema::{
    properties_by_number, to_pascal_case, CustomMethod, CustomVerb, Property, PropertyType,
};

/// Generate the OpenAPI document for a resolved service.
pub fn generate_openapi(service: &ResolvedService) -> CodegenResult<OpenApiDocument> {
    let mut builder = OpenApiBuilder::new(service);
    builder.build()?;
    let servers = if service.url.is_empty() {
        Vec::new()
    } else {
        vec![Server {
            url: service.url.clone(),
        }]
    };
    Ok(OpenApiDocument {
        openapi: "3.1.0".to_string(),
        info: Info {
            title: service.name.clone(),
            description: format!("An API for {}", service.name),
            version: "version not set".to_string(),
        },
        servers,
        paths: builder.paths,
        components: Components {
            schemas: builder.schemas,
        },
    })
}

/// Generate the OpenAPI document serialized as pretty-printed JSON with a
/// trailing newline.
pub fn generate_openapi_json(service: &ResolvedService) -> CodegenResult<String> {
    let document = generate_openapi(service)?;
    let mut json = serde_json::to_string_pretty(&document)?;
    json.push('\n');
    Ok(json)
}

// ── Document model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    pub paths: BTreeMap<String, PathItem>,
    pub components: Components,
}

#[derive(Debug, Clone, Serialize)]
pub struct Info {
    pub title: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Server {
    pub url: String,
}

/// The operations available on one URL.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: SchemaObject,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaType {
    pub schema: SchemaObject,
}

#[derive(Debug, Clone, Serialize)]
pub struct Components {
    pub schemas: BTreeMap<String, SchemaObject>,
}

/// A schema fragment: either a `$ref` or an inline type description.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaObject {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaObject>,
    /// Required property names, in field-number order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaObject>>,
    #[serde(rename = "readOnly", skip_serializing_if = "is_false")]
    pub read_only: bool,
    /// Marks the field Terraform uses as the resource id.
    #[serde(rename = "x-terraform-id", skip_serializing_if = "is_false")]
    pub x_terraform_id: bool,
    #[serde(rename = "x-aep-resource", skip_serializing_if = "Option::is_none")]
    pub x_aep_resource: Option<XAepResource>,
}

/// Resource identity metadata consumed by external tooling. Stable across
/// regenerations for the same definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XAepResource {
    pub singular: String,
    pub plural: String,
    pub patterns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ── Builder ──────────────────────────────────────────────────────────────────

struct OpenApiBuilder<'a> {
    service: &'a ResolvedService,
    /// Component schemas by bare name; doubles as the generation cache.
    schemas: BTreeMap<String, SchemaObject>,
    /// Names currently being generated; a reference back into this set keeps
    /// the `$ref` and stops the recursion.
    in_progress: BTreeSet<String>,
    paths: BTreeMap<String, PathItem>,
}

impl<'a> OpenApiBuilder<'a> {
    fn new(service: &'a ResolvedService) -> Self {
        Self {
            service,
            schemas: BTreeMap::new(),
            in_progress: BTreeSet::new(),
            paths: BTreeMap::new(),
        }
    }

    fn build(&mut self) -> CodegenResult<()> {
        for id in 0..self.service.resources.len() {
            let kind = self.service.resources[id].kind.clone();
            self.ensure_schema(&kind, &kind)?;
        }
        let schema_names: Vec<String> = self.service.schemas.keys().cloned().collect();
        for name in schema_names {
            self.ensure_schema(&name, &name)?;
        }
        for id in 0..self.service.resources.len() {
            self.add_paths(id)?;
        }
        Ok(())
    }

    /// Resolve a type reference to its component-schema name, generating the
    /// schema on first use.
    fn ensure_schema(&mut self, reference: &str, referrer: &str) -> CodegenResult<String> {
        let bare = reference
            .strip_prefix(&format!("{}/", self.service.name))
            .unwrap_or(reference);
        if bare.contains('/') {
            // Qualified to a different service; nothing local can satisfy it.
            return Err(CodegenError::UnknownReference {
                reference: reference.to_string(),
                referrer: referrer.to_string(),
            });
        }
        if self.schemas.contains_key(bare) || self.in_progress.contains(bare) {
            return Ok(bare.to_string());
        }
        let bare = bare.to_string();
        let fq = format!("{}/{}", self.service.name, bare);
        self.in_progress.insert(bare.clone());
        let result = if let Some(&id) = self.service.by_type.get(&fq) {
            self.resource_schema(id)
        } else if let Some(properties) = self.service.schemas.get(&bare).cloned() {
            self.object_schema(&properties)
        } else {
            Err(CodegenError::UnknownReference {
                reference: fq,
                referrer: referrer.to_string(),
            })
        };
        self.in_progress.remove(&bare);
        let schema = result?;
        self.schemas.insert(bare.clone(), schema);
        Ok(bare)
    }

    /// The full component schema for a resource: its properties plus the
    /// terraform id marker and the `x-aep-resource` extension.
    fn resource_schema(&mut self, id: ResourceId) -> CodegenResult<SchemaObject> {
        let properties = self.service.resources[id].properties.clone();
        let mut schema = self.object_schema(&properties)?;
        if let Some(id_property) = schema.properties.get_mut("id") {
            id_property.x_terraform_id = true;
        }
        let resource = &self.service.resources[id];
        schema.x_aep_resource = Some(XAepResource {
            singular: resource.kind.clone(),
            plural: resource.plural.clone(),
            patterns: self.service.pattern_strings(id),
            parents: resource
                .parents
                .iter()
                .map(|&parent_id| self.service.resources[parent_id].kind.clone())
                .collect(),
        });
        Ok(schema)
    }

    fn object_schema(
        &mut self,
        properties: &BTreeMap<String, Property>,
    ) -> CodegenResult<SchemaObject> {
        let mut schema = SchemaObject {
            schema_type: Some("object".to_string()),
            ..Default::default()
        };
        for (name, property) in properties_by_number(properties) {
            let mut property_schema = self.type_schema(name, &property.property_type)?;
            if property.read_only {
                property_schema.read_only = true;
            }
            if property.required {
                schema.required.push(name.to_string());
            }
            schema.properties.insert(name.to_string(), property_schema);
        }
        Ok(schema)
    }

    /// Map a property type to its OpenAPI schema fragment.
    fn type_schema(
        &mut self,
        property: &str,
        property_type: &PropertyType,
    ) -> CodegenResult<SchemaObject> {
        match property_type {
            PropertyType::String => Ok(typed("string", None)),
            PropertyType::Bool => Ok(typed("boolean", None)),
            PropertyType::Int32 => Ok(typed("integer", Some("int32"))),
            PropertyType::Int64 => Ok(typed("integer", Some("int64"))),
            PropertyType::Float => Ok(typed("number", Some("float"))),
            PropertyType::Double => Ok(typed("number", Some("double"))),
            PropertyType::Array { items } => {
                if matches!(items.as_ref(), PropertyType::Array { .. }) {
                    return Err(CodegenError::UnsupportedType {
                        property: property.to_string(),
                        detail: "nested arrays are not supported".to_string(),
                    });
                }
                let item_schema = self.type_schema(property, items)?;
                Ok(SchemaObject {
                    schema_type: Some("array".to_string()),
                    items: Some(Box::new(item_schema)),
                    ..Default::default()
                })
            }
            PropertyType::Object {
                reference: Some(reference),
                ..
            } => {
                let bare = self.ensure_schema(reference, property)?;
                Ok(SchemaObject {
                    reference: Some(format!("#/components/schemas/{bare}")),
                    ..Default::default()
                })
            }
            PropertyType::Object {
                reference: None,
                properties,
            } => self.object_schema(properties),
        }
    }

    // ── Paths ────────────────────────────────────────────────────────────────

    fn add_paths(&mut self, id: ResourceId) -> CodegenResult<()> {
        let resource = self.service.resources[id].clone();
        let kind_pascal = to_pascal_case(&resource.kind);
        let item_path = format!("/{}", self.service.item_path_template(id));
        let collection_path = format!("/{}", self.service.collection_path_template(id));
        let resource_ref = schema_ref(&resource.kind);

        if let Some(create) = &resource.methods.create {
            let mut parameters = path_parameters(&collection_path);
            if !create.non_client_settable_id {
                parameters.push(Parameter {
                    name: "id".to_string(),
                    location: "query".to_string(),
                    required: false,
                    schema: typed("string", None),
                });
            }
            let operation = Operation {
                operation_id: format!("Create{kind_pascal}"),
                description: format!("An aep-compliant Create method for {}.", resource.kind),
                parameters,
                request_body: Some(json_body(resource_ref.clone())),
                responses: ok_response(resource_ref.clone()),
            };
            self.paths.entry(collection_path.clone()).or_default().post = Some(operation);
        }

        if resource.methods.get.is_some() {
            let operation = Operation {
                operation_id: format!("Get{kind_pascal}"),
                description: format!("An aep-compliant Get method for {}.", resource.kind),
                parameters: path_parameters(&item_path),
                request_body: None,
                responses: ok_response(resource_ref.clone()),
            };
            self.paths.entry(item_path.clone()).or_default().get = Some(operation);
        }

        if resource.methods.update.is_some() {
            let operation = Operation {
                operation_id: format!("Update{kind_pascal}"),
                description: format!("An aep-compliant Update method for {}.", resource.kind),
                parameters: path_parameters(&item_path),
                request_body: Some(json_body(resource_ref.clone())),
                responses: ok_response(resource_ref.clone()),
            };
            self.paths.entry(item_path.clone()).or_default().patch = Some(operation);
        }

        if resource.methods.delete.is_some() {
            let mut responses = BTreeMap::new();
            responses.insert(
                "204".to_string(),
                Response {
                    description: "Successful response".to_string(),
                    content: BTreeMap::new(),
                },
            );
            let operation = Operation {
                operation_id: format!("Delete{kind_pascal}"),
                description: format!("An aep-compliant Delete method for {}.", resource.kind),
                parameters: path_parameters(&item_path),
                request_body: None,
                responses,
            };
            self.paths.entry(item_path.clone()).or_default().delete = Some(operation);
        }

        if let Some(list) = &resource.methods.list {
            let plural_pascal = to_pascal_case(&resource.plural);
            let mut parameters = path_parameters(&collection_path);
            parameters.push(Parameter {
                name: "max_page_size".to_string(),
                location: "query".to_string(),
                required: false,
                schema: typed("integer", Some("int32")),
            });
            parameters.push(Parameter {
                name: "page_token".to_string(),
                location: "query".to_string(),
                required: false,
                schema: typed("string", None),
            });
            let mut response_schema = SchemaObject {
                schema_type: Some("object".to_string()),
                ..Default::default()
            };
            response_schema.properties.insert(
                "results".to_string(),
                SchemaObject {
                    schema_type: Some("array".to_string()),
                    items: Some(Box::new(resource_ref.clone())),
                    ..Default::default()
                },
            );
            response_schema
                .properties
                .insert("next_page_token".to_string(), typed("string", None));
            if list.has_unreachable_resources {
                response_schema.properties.insert(
                    "unreachable".to_string(),
                    SchemaObject {
                        schema_type: Some("array".to_string()),
                        items: Some(Box::new(typed("string", None))),
                        ..Default::default()
                    },
                );
            }
            let operation = Operation {
                operation_id: format!("List{plural_pascal}"),
                description: format!("An aep-compliant List method for {}.", resource.plural),
                parameters,
                request_body: None,
                responses: ok_response(response_schema),
            };
            self.paths.entry(collection_path.clone()).or_default().get = Some(operation);
        }

        if resource.methods.apply.is_some() {
            let operation = Operation {
                operation_id: format!("Apply{kind_pascal}"),
                description: format!("An aep-compliant Apply method for {}.", resource.kind),
                parameters: path_parameters(&item_path),
                request_body: Some(json_body(resource_ref.clone())),
                responses: ok_response(resource_ref.clone()),
            };
            self.paths.entry(item_path.clone()).or_default().put = Some(operation);
        }

        for custom in &resource.methods.custom {
            self.add_custom_path(&item_path, &kind_pascal, &resource.kind, custom)?;
        }

        Ok(())
    }

    fn add_custom_path(
        &mut self,
        item_path: &str,
        kind_pascal: &str,
        kind: &str,
        custom: &CustomMethod,
    ) -> CodegenResult<()> {
        let custom_pascal = to_pascal_case(&custom.name);
        let custom_path = format!("{item_path}:{}", custom.name);
        let request_body = match custom.method {
            CustomVerb::Post => Some(json_body(self.object_schema(&custom.request)?)),
            CustomVerb::Get => None,
        };
        let operation = Operation {
            operation_id: format!("{custom_pascal}{kind_pascal}"),
            description: format!("A custom {custom_pascal} method for {kind}."),
            parameters: path_parameters(&custom_path),
            request_body,
            responses: ok_response(self.object_schema(&custom.response)?),
        };
        let item = self.paths.entry(custom_path).or_default();
        match custom.method {
            CustomVerb::Post => item.post = Some(operation),
            CustomVerb::Get => item.get = Some(operation),
        }
        Ok(())
    }
}

// ── Fragment helpers ─────────────────────────────────────────────────────────

fn typed(schema_type: &str, format: Option<&str>) -> SchemaObject {
    SchemaObject {
        schema_type: Some(schema_type.to_string()),
        format: format.map(str::to_string),
        ..Default::default()
    }
}

fn schema_ref(name: &str) -> SchemaObject {
    SchemaObject {
        reference: Some(format!("#/components/schemas/{name}")),
        ..Default::default()
    }
}

fn json_body(schema: SchemaObject) -> RequestBody {
    let mut content = BTreeMap::new();
    content.insert("application/json".to_string(), MediaType { schema });
    RequestBody {
        required: true,
        content,
    }
}

fn ok_response(schema: SchemaObject) -> BTreeMap<String, Response> {
    let mut content = BTreeMap::new();
    content.insert("application/json".to_string(), MediaType { schema });
    let mut responses = BTreeMap::new();
    responses.insert(
        "200".to_string(),
        Response {
            description: "Successful response".to_string(),
            content,
        },
    );
    responses
}

/// One path parameter per `{placeholder}` in the template, in order.
fn path_parameters(template: &str) -> Vec<Parameter> {
    let mut parameters = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else { break };
        parameters.push(Parameter {
            name: after[..end].to_string(),
            location: "path".to_string(),
            required: true,
            schema: typed("string", None),
        });
        rest = &after[end + 1..];
    }
    parameters
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use crate::schema::Service;

    const BOOKSTORE_YAML: &str = r#"
name: bookstore.example.com
url: http://localhost:8081
resources:
  - kind: publisher
    plural: publishers
    properties:
      description:
        type: string
        number: 1
    methods:
      create: {}
      list: {}
  - kind: book
    plural: books
    parents: [publisher]
    properties:
      title:
        type: string
        number: 1
        required: true
      pages:
        type: int32
        number: 2
      author:
        type: object
        number: 3
        reference: author
    methods:
      create:
        non_client_settable_id: true
      get: {}
      update: {}
      delete: {}
      list:
        has_unreachable_resources: true
      apply: {}
      custom:
        - name: archive
          method: post
          request:
            reason:
              type: string
              number: 1
          response:
            archived:
              type: bool
              number: 1
  - kind: bookEdition
    plural: book-editions
    parents: [book]
    properties:
      year:
        type: int32
        number: 1
    methods:
      get: {}
      list: {}
schemas:
  - name: author
    properties:
      first_name:
        type: string
        number: 1
"#;

    fn bookstore_document() -> OpenApiDocument {
        let service = Service::from_yaml(BOOKSTORE_YAML).unwrap();
        generate_openapi(&resolve(&service).unwrap()).unwrap()
    }

    #[test]
    fn document_header() {
        let document = bookstore_document();
        assert_eq!(document.openapi, "3.1.0");
        assert_eq!(document.info.title, "bookstore.example.com");
        assert_eq!(document.info.description, "An API for bookstore.example.com");
        assert_eq!(document.info.version, "version not set");
        assert_eq!(document.servers[0].url, "http://localhost:8081");
    }

    #[test]
    fn resource_schema_carries_generated_fields() {
        let document = bookstore_document();
        let book = &document.components.schemas["book"];
        assert_eq!(book.schema_type.as_deref(), Some("object"));
        assert!(book.properties["path"].read_only);
        assert!(book.properties["id"].read_only);
        assert!(book.properties["id"].x_terraform_id);
        assert!(!book.properties["path"].x_terraform_id);
        assert_eq!(book.required, vec!["title"]);
    }

    #[test]
    fn x_aep_resource_extension() {
        let document = bookstore_document();
        let extension = document.components.schemas["book"]
            .x_aep_resource
            .as_ref()
            .unwrap();
        assert_eq!(extension.singular, "book");
        assert_eq!(extension.plural, "books");
        assert_eq!(extension.patterns, vec!["publishers/{publisher}/books/{book}"]);
        assert_eq!(extension.parents, vec!["publisher"]);
        // shared schemas are plain objects without the extension
        assert!(document.components.schemas["author"].x_aep_resource.is_none());
    }

    #[test]
    fn multi_parent_patterns_cross_product() {
        let yaml = r#"
name: files.example.com
resources:
  - kind: folder
    plural: folders
  - kind: project
    plural: projects
  - kind: document
    plural: documents
    parents: [folder, project]
"#;
        let service = Service::from_yaml(yaml).unwrap();
        let document = generate_openapi(&resolve(&service).unwrap()).unwrap();
        let extension = document.components.schemas["document"]
            .x_aep_resource
            .as_ref()
            .unwrap();
        assert_eq!(
            extension.patterns,
            vec![
                "folders/{folder}/documents/{document}",
                "projects/{project}/documents/{document}",
            ]
        );
    }

    #[test]
    fn referenced_schema_becomes_ref() {
        let document = bookstore_document();
        let book = &document.components.schemas["book"];
        assert_eq!(
            book.properties["author"].reference.as_deref(),
            Some("#/components/schemas/author")
        );
        assert!(document.components.schemas.contains_key("author"));
    }

    #[test]
    fn create_operations() {
        let document = bookstore_document();

        // root resource: bare collection URL, client-settable id
        let publishers = &document.paths["/publishers"];
        let create = publishers.post.as_ref().unwrap();
        assert_eq!(create.operation_id, "CreatePublisher");
        assert!(create
            .parameters
            .iter()
            .any(|p| p.name == "id" && p.location == "query"));
        let body = create.request_body.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(
            body.content["application/json"].schema.reference.as_deref(),
            Some("#/components/schemas/publisher")
        );

        // child resource: parent-qualified URL, id suppressed
        let books = &document.paths["/publishers/{publisher}/books"];
        let create = books.post.as_ref().unwrap();
        assert_eq!(create.operation_id, "CreateBook");
        assert!(create
            .parameters
            .iter()
            .any(|p| p.name == "publisher" && p.location == "path" && p.required));
        assert!(!create.parameters.iter().any(|p| p.name == "id"));
    }

    #[test]
    fn list_operation_and_response() {
        let document = bookstore_document();
        let books = &document.paths["/publishers/{publisher}/books"];
        let list = books.get.as_ref().unwrap();
        assert_eq!(list.operation_id, "ListBooks");
        assert!(list
            .parameters
            .iter()
            .any(|p| p.name == "max_page_size" && p.location == "query"));
        assert!(list
            .parameters
            .iter()
            .any(|p| p.name == "page_token" && p.location == "query"));

        let schema = &list.responses["200"].content["application/json"].schema;
        let results = &schema.properties["results"];
        assert_eq!(results.schema_type.as_deref(), Some("array"));
        assert_eq!(
            results.items.as_ref().unwrap().reference.as_deref(),
            Some("#/components/schemas/book")
        );
        assert_eq!(
            schema.properties["next_page_token"].schema_type.as_deref(),
            Some("string")
        );
        assert!(schema.properties.contains_key("unreachable"));

        // editions do not enable unreachable
        let editions = &document.paths["/publishers/{publisher}/books/{book}/editions"];
        let list = editions.get.as_ref().unwrap();
        let schema = &list.responses["200"].content["application/json"].schema;
        assert!(!schema.properties.contains_key("unreachable"));
    }

    #[test]
    fn item_operations() {
        let document = bookstore_document();
        let item = &document.paths["/publishers/{publisher}/books/{book}"];

        let get = item.get.as_ref().unwrap();
        assert_eq!(get.operation_id, "GetBook");
        let names: Vec<&str> = get.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["publisher", "book"]);

        let patch = item.patch.as_ref().unwrap();
        assert_eq!(patch.operation_id, "UpdateBook");
        assert!(patch.request_body.is_some());

        let put = item.put.as_ref().unwrap();
        assert_eq!(put.operation_id, "ApplyBook");

        let delete = item.delete.as_ref().unwrap();
        assert_eq!(delete.operation_id, "DeleteBook");
        assert!(delete.responses.contains_key("204"));
        assert!(delete.responses["204"].content.is_empty());
    }

    #[test]
    fn three_level_item_path_dedups_collection() {
        let document = bookstore_document();
        let path = "/publishers/{publisher}/books/{book}/editions/{bookEdition}";
        assert!(
            document.paths.contains_key(path),
            "paths: {:?}",
            document.paths.keys().collect::<Vec<_>>()
        );
        assert_eq!(
            document.paths[path].get.as_ref().unwrap().operation_id,
            "GetBookEdition"
        );
    }

    #[test]
    fn custom_method_path() {
        let document = bookstore_document();
        let custom = &document.paths["/publishers/{publisher}/books/{book}:archive"];
        let post = custom.post.as_ref().unwrap();
        assert_eq!(post.operation_id, "ArchiveBook");
        let body = post.request_body.as_ref().unwrap();
        let schema = &body.content["application/json"].schema;
        assert!(schema.properties.contains_key("reason"));
        let response = &post.responses["200"].content["application/json"].schema;
        assert_eq!(
            response.properties["archived"].schema_type.as_deref(),
            Some("boolean")
        );
    }

    #[test]
    fn json_serialization_shape() {
        let service = Service::from_yaml(BOOKSTORE_YAML).unwrap();
        let json = generate_openapi_json(&resolve(&service).unwrap()).unwrap();
        assert!(json.starts_with("{\n  \"openapi\": \"3.1.0\""), "{json}");
        assert!(json.ends_with("\n"), "missing trailing newline");
        assert!(json.contains("\"$ref\": \"#/components/schemas/author\""), "{json}");
        assert!(json.contains("\"x-aep-resource\""), "{json}");
        assert!(json.contains("\"x-terraform-id\": true"), "{json}");
        assert!(json.contains("\"readOnly\": true"), "{json}");
        assert!(!json.contains("x_aep_resource"), "rust field name leaked:\n{json}");
    }

    #[test]
    fn output_is_deterministic() {
        let service = Service::from_yaml(BOOKSTORE_YAML).unwrap();
        let resolved = resolve(&service).unwrap();
        let first = generate_openapi_json(&resolved).unwrap();
        let second = generate_openapi_json(&resolved).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn book_round_trip_scenario() {
        let yaml = r#"
name: bookstore.example.com
resources:
  - kind: book
    plural: books
    properties:
      price:
        type: double
        number: 1
      published:
        type: bool
        number: 2
    methods:
      create: {}
      get: {}
      list: {}
"#;
        let service = Service::from_yaml(yaml).unwrap();
        let document = generate_openapi(&resolve(&service).unwrap()).unwrap();

        let create = document.paths["/books"].post.as_ref().unwrap();
        assert!(create.request_body.as_ref().unwrap().required);

        let list = document.paths["/books"].get.as_ref().unwrap();
        let schema = &list.responses["200"].content["application/json"].schema;
        assert_eq!(
            schema.properties["results"].schema_type.as_deref(),
            Some("array")
        );
        assert_eq!(
            schema.properties["results"]
                .items
                .as_ref()
                .unwrap()
                .reference
                .as_deref(),
            Some("#/components/schemas/book")
        );
        assert_eq!(
            schema.properties["next_page_token"].schema_type.as_deref(),
            Some("string")
        );

        let book = &document.components.schemas["book"];
        assert_eq!(book.properties["price"].schema_type.as_deref(), Some("number"));
        assert_eq!(book.properties["price"].format.as_deref(), Some("double"));
        assert_eq!(
            book.properties["published"].schema_type.as_deref(),
            Some("boolean")
        );
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let yaml = r#"
name: bookstore.example.com
resources:
  - kind: book
    plural: books
    properties:
      author:
        type: object
        number: 1
        reference: ghost
"#;
        let service = Service::from_yaml(yaml).unwrap();
        let err = generate_openapi(&resolve(&service).unwrap()).unwrap_err();
        assert!(err.to_string().contains("could not find message"), "{err}");
    }
}

//! Protobuf IDL generation
//!
//! Walks the resolved graph and renders a `.proto` file: one message per
//! resource and shared schema, request/response messages and one RPC per
//! enabled method, with `google.api.http` path templates and
//! field-behavior/resource-reference annotations.
//!
//! Message generation is memoized by fully-qualified type name, so a schema
//! referenced from several resources is emitted exactly once and
//! self-referential types terminate.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CodegenError, CodegenResult};
use crate::resolve::{ResolvedResource, ResolvedService, ResourceId};
use crate::schema::{
    properties_by_number, to_pascal_case, to_snake_case, CreateMethod, CustomMethod, CustomVerb,
    ListMethod, Property, PropertyType, FIELD_NUMBER_ID, FIELD_NUMBER_MAX_PAGE_SIZE,
    FIELD_NUMBER_NEXT_PAGE_TOKEN, FIELD_NUMBER_PAGE_TOKEN, FIELD_NUMBER_PARENT,
    FIELD_NUMBER_PATH, FIELD_NUMBER_RESOURCE, FIELD_NUMBER_RESOURCES, FIELD_NUMBER_UNREACHABLE,
    FIELD_NUMBER_UPDATE_MASK,
};

const ANNOTATIONS_IMPORT: &str = "google/api/annotations.proto";
const CLIENT_IMPORT: &str = "google/api/client.proto";
const FIELD_BEHAVIOR_IMPORT: &str = "google/api/field_behavior.proto";
const RESOURCE_IMPORT: &str = "google/api/resource.proto";
const EMPTY_IMPORT: &str = "google/protobuf/empty.proto";
const FIELD_MASK_IMPORT: &str = "google/protobuf/field_mask.proto";

const REQUIRED_OPTION: &str = "(google.api.field_behavior) = REQUIRED";

/// Generate the protobuf IDL for a resolved service.
pub fn generate_proto(service: &ResolvedService) -> CodegenResult<String> {
    let mut builder = ProtoBuilder::new(service);
    builder.build()?;
    Ok(builder.render())
}

// ── Document model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct ProtoMessage {
    name: String,
    comment: String,
    fields: Vec<ProtoField>,
    nested: Vec<ProtoMessage>,
}

#[derive(Debug, Clone)]
struct ProtoField {
    name: String,
    comment: String,
    type_name: String,
    number: u32,
    repeated: bool,
    options: Vec<String>,
}

#[derive(Debug, Clone)]
struct Rpc {
    name: String,
    comment: String,
    request: String,
    response: String,
    http: HttpRule,
    method_signature: Option<String>,
}

#[derive(Debug, Clone)]
struct HttpRule {
    verb: &'static str,
    path: String,
    body: Option<String>,
}

// ── Builder ──────────────────────────────────────────────────────────────────

struct ProtoBuilder<'a> {
    service: &'a ResolvedService,
    /// Fully-qualified type name to generated message name.
    cache: BTreeMap<String, String>,
    /// Types currently being generated; a reference back into this set is a
    /// forward reference, not a reason to recurse.
    in_progress: BTreeSet<String>,
    /// Completed top-level messages, in emit order.
    messages: Vec<ProtoMessage>,
    imports: BTreeSet<&'static str>,
    rpcs: Vec<Rpc>,
}

impl<'a> ProtoBuilder<'a> {
    fn new(service: &'a ResolvedService) -> Self {
        Self {
            service,
            cache: BTreeMap::new(),
            in_progress: BTreeSet::new(),
            messages: Vec::new(),
            imports: BTreeSet::new(),
            rpcs: Vec::new(),
        }
    }

    fn build(&mut self) -> CodegenResult<()> {
        // Resource and schema messages first, then per-method messages, so
        // every data type exists before a request embeds it.
        for id in 0..self.service.resources.len() {
            let kind = self.service.resources[id].kind.clone();
            self.ensure_message(&kind, &kind)?;
        }
        let schema_names: Vec<String> = self.service.schemas.keys().cloned().collect();
        for name in schema_names {
            self.ensure_message(&name, &name)?;
        }
        for id in 0..self.service.resources.len() {
            self.add_methods(id)?;
        }
        Ok(())
    }

    /// Resolve a type reference to its message name, generating the message
    /// on first use. Unqualified references are resolved against the owning
    /// service.
    fn ensure_message(&mut self, reference: &str, referrer: &str) -> CodegenResult<String> {
        let fq = if reference.contains('/') {
            reference.to_string()
        } else {
            format!("{}/{}", self.service.name, reference)
        };
        if let Some(name) = self.cache.get(&fq) {
            return Ok(name.clone());
        }
        let bare = fq.rsplit('/').next().unwrap_or_default().to_string();
        if self.in_progress.contains(&fq) {
            return Ok(to_pascal_case(&bare));
        }
        if let Some(&rid) = self.service.by_type.get(&fq) {
            let properties = self.service.resources[rid].properties.clone();
            return self.generate_named_message(&fq, &to_pascal_case(&bare), &properties);
        }
        if fq == format!("{}/{}", self.service.name, bare) {
            if let Some(properties) = self.service.schemas.get(&bare).cloned() {
                return self.generate_named_message(&fq, &to_pascal_case(&bare), &properties);
            }
        }
        Err(CodegenError::UnknownReference {
            reference: fq,
            referrer: referrer.to_string(),
        })
    }

    fn generate_named_message(
        &mut self,
        fq: &str,
        name: &str,
        properties: &BTreeMap<String, Property>,
    ) -> CodegenResult<String> {
        self.in_progress.insert(fq.to_string());
        let message = self.build_message(name, format!("A {name}."), properties)?;
        self.in_progress.remove(fq);
        self.cache.insert(fq.to_string(), name.to_string());
        self.messages.push(message);
        Ok(name.to_string())
    }

    /// Build a message from a property map, fields in ascending field-number
    /// order, inline objects as nested messages.
    fn build_message(
        &mut self,
        name: &str,
        comment: String,
        properties: &BTreeMap<String, Property>,
    ) -> CodegenResult<ProtoMessage> {
        let mut message = ProtoMessage {
            name: name.to_string(),
            comment,
            fields: Vec::new(),
            nested: Vec::new(),
        };
        for (prop_name, prop) in properties_by_number(properties) {
            let (type_name, repeated) =
                self.field_type(prop_name, &prop.property_type, &mut message.nested)?;
            let mut options = Vec::new();
            if prop.required {
                options.push(REQUIRED_OPTION.to_string());
                self.imports.insert(FIELD_BEHAVIOR_IMPORT);
            }
            message.fields.push(ProtoField {
                name: prop_name.to_string(),
                comment: format!("Field for {prop_name}."),
                type_name,
                number: prop.number,
                repeated,
                options,
            });
        }
        Ok(message)
    }

    /// Map a property type to a proto field type name plus the repeated flag.
    fn field_type(
        &mut self,
        property: &str,
        property_type: &PropertyType,
        nested: &mut Vec<ProtoMessage>,
    ) -> CodegenResult<(String, bool)> {
        match property_type {
            PropertyType::String => Ok(("string".to_string(), false)),
            PropertyType::Bool => Ok(("bool".to_string(), false)),
            PropertyType::Int32 => Ok(("int32".to_string(), false)),
            PropertyType::Int64 => Ok(("int64".to_string(), false)),
            PropertyType::Float => Ok(("float".to_string(), false)),
            PropertyType::Double => Ok(("double".to_string(), false)),
            PropertyType::Array { items } => {
                if matches!(items.as_ref(), PropertyType::Array { .. }) {
                    return Err(CodegenError::UnsupportedType {
                        property: property.to_string(),
                        detail: "nested arrays are not supported".to_string(),
                    });
                }
                let (inner, _) = self.field_type(property, items, nested)?;
                Ok((inner, true))
            }
            PropertyType::Object {
                reference: Some(reference),
                ..
            } => Ok((self.ensure_message(reference, property)?, false)),
            PropertyType::Object {
                reference: None,
                properties,
            } => {
                let nested_name = to_pascal_case(property);
                let message =
                    self.build_message(&nested_name, format!("A {nested_name}."), properties)?;
                nested.push(message);
                Ok((nested_name, false))
            }
        }
    }

    // ── Methods ──────────────────────────────────────────────────────────────

    fn add_methods(&mut self, id: ResourceId) -> CodegenResult<()> {
        let resource = self.service.resources[id].clone();
        if let Some(create) = &resource.methods.create {
            self.add_create(id, &resource, create);
        }
        if resource.methods.get.is_some() {
            self.add_get(id, &resource);
        }
        if resource.methods.update.is_some() {
            self.add_update(id, &resource);
        }
        if resource.methods.delete.is_some() {
            self.add_delete(id, &resource);
        }
        if let Some(list) = &resource.methods.list {
            self.add_list(id, &resource, list);
        }
        if resource.methods.apply.is_some() {
            self.add_apply(id, &resource);
        }
        for custom in &resource.methods.custom {
            self.add_custom(id, &resource, custom)?;
        }
        Ok(())
    }

    fn add_create(&mut self, id: ResourceId, resource: &ResolvedResource, create: &CreateMethod) {
        let kind = &resource.kind;
        let pascal = to_pascal_case(kind);
        let snake = to_snake_case(kind);
        let mut fields = vec![self.parent_field(kind)];
        if !create.non_client_settable_id {
            fields.push(id_field());
        }
        fields.push(self.resource_field(&snake, &pascal));
        self.messages.push(ProtoMessage {
            name: format!("Create{pascal}Request"),
            comment: format!("A Create request for a {kind} resource."),
            fields,
            nested: Vec::new(),
        });
        self.push_rpc(Rpc {
            name: format!("Create{pascal}"),
            comment: format!("An aep-compliant Create method for {kind}."),
            request: format!("Create{pascal}Request"),
            response: pascal,
            http: HttpRule {
                verb: "post",
                path: self.parent_collection_rule(id),
                body: Some(snake.clone()),
            },
            method_signature: Some(format!("parent,{snake}")),
        });
    }

    fn add_get(&mut self, id: ResourceId, resource: &ResolvedResource) {
        let kind = &resource.kind;
        let pascal = to_pascal_case(kind);
        let path_field = self.path_field(&resource.fq_type);
        self.messages.push(ProtoMessage {
            name: format!("Get{pascal}Request"),
            comment: format!("Request message for the Get{pascal} method."),
            fields: vec![path_field],
            nested: Vec::new(),
        });
        self.push_rpc(Rpc {
            name: format!("Get{pascal}"),
            comment: format!("An aep-compliant Get method for {kind}."),
            request: format!("Get{pascal}Request"),
            response: pascal,
            http: HttpRule {
                verb: "get",
                path: format!("/{{path={}}}", self.service.item_wildcard_pattern(id)),
                body: None,
            },
            method_signature: Some("path".to_string()),
        });
    }

    fn add_update(&mut self, id: ResourceId, resource: &ResolvedResource) {
        let kind = &resource.kind;
        let pascal = to_pascal_case(kind);
        let snake = to_snake_case(kind);
        let fields = vec![
            self.path_field(&resource.fq_type),
            self.resource_field(&snake, &pascal),
            update_mask_field(),
        ];
        self.imports.insert(FIELD_MASK_IMPORT);
        self.messages.push(ProtoMessage {
            name: format!("Update{pascal}Request"),
            comment: format!("Request message for the Update{pascal} method."),
            fields,
            nested: Vec::new(),
        });
        self.push_rpc(Rpc {
            name: format!("Update{pascal}"),
            comment: format!("An aep-compliant Update method for {kind}."),
            request: format!("Update{pascal}Request"),
            response: pascal,
            http: HttpRule {
                verb: "patch",
                path: format!("/{{path={}}}", self.service.item_wildcard_pattern(id)),
                body: Some(snake.clone()),
            },
            method_signature: Some(format!("{snake},update_mask")),
        });
    }

    fn add_delete(&mut self, id: ResourceId, resource: &ResolvedResource) {
        let kind = &resource.kind;
        let pascal = to_pascal_case(kind);
        let path_field = self.path_field(&resource.fq_type);
        self.messages.push(ProtoMessage {
            name: format!("Delete{pascal}Request"),
            comment: format!("Request message for the Delete{pascal} method."),
            fields: vec![path_field],
            nested: Vec::new(),
        });
        self.imports.insert(EMPTY_IMPORT);
        self.push_rpc(Rpc {
            name: format!("Delete{pascal}"),
            comment: format!("An aep-compliant Delete method for {kind}."),
            request: format!("Delete{pascal}Request"),
            response: "google.protobuf.Empty".to_string(),
            http: HttpRule {
                verb: "delete",
                path: format!("/{{path={}}}", self.service.item_wildcard_pattern(id)),
                body: None,
            },
            method_signature: Some("path".to_string()),
        });
    }

    fn add_list(&mut self, id: ResourceId, resource: &ResolvedResource, list: &ListMethod) {
        let kind_pascal = to_pascal_case(&resource.kind);
        let plural_pascal = to_pascal_case(&resource.plural);
        let request_fields = vec![
            self.parent_field(&resource.kind),
            page_token_field(),
            max_page_size_field(),
        ];
        self.messages.push(ProtoMessage {
            name: format!("List{plural_pascal}Request"),
            comment: format!("Request message for the List{plural_pascal} method."),
            fields: request_fields,
            nested: Vec::new(),
        });
        let mut response_fields = vec![
            results_field(&resource.plural, &kind_pascal),
            next_page_token_field(),
        ];
        if list.has_unreachable_resources {
            response_fields.push(unreachable_field());
        }
        self.messages.push(ProtoMessage {
            name: format!("List{plural_pascal}Response"),
            comment: format!("Response message for the List{plural_pascal} method."),
            fields: response_fields,
            nested: Vec::new(),
        });
        self.push_rpc(Rpc {
            name: format!("List{plural_pascal}"),
            comment: format!("An aep-compliant List method for {}.", resource.plural),
            request: format!("List{plural_pascal}Request"),
            response: format!("List{plural_pascal}Response"),
            http: HttpRule {
                verb: "get",
                path: self.parent_collection_rule(id),
                body: None,
            },
            method_signature: Some("parent".to_string()),
        });
    }

    fn add_apply(&mut self, id: ResourceId, resource: &ResolvedResource) {
        let kind = &resource.kind;
        let pascal = to_pascal_case(kind);
        let snake = to_snake_case(kind);
        let fields = vec![
            self.path_field(&resource.fq_type),
            self.resource_field(&snake, &pascal),
        ];
        self.messages.push(ProtoMessage {
            name: format!("Apply{pascal}Request"),
            comment: format!("Request message for the Apply{pascal} method."),
            fields,
            nested: Vec::new(),
        });
        self.push_rpc(Rpc {
            name: format!("Apply{pascal}"),
            comment: format!("An aep-compliant Apply method for {kind}."),
            request: format!("Apply{pascal}Request"),
            response: pascal,
            http: HttpRule {
                verb: "put",
                path: format!("/{{path={}}}", self.service.item_wildcard_pattern(id)),
                body: Some(snake),
            },
            method_signature: None,
        });
    }

    fn add_custom(
        &mut self,
        id: ResourceId,
        resource: &ResolvedResource,
        custom: &CustomMethod,
    ) -> CodegenResult<()> {
        let rpc_name = format!(
            "{}{}",
            to_pascal_case(&custom.name),
            to_pascal_case(&resource.kind)
        );
        let mut request = self.build_message(
            &format!("{rpc_name}Request"),
            format!("Request message for the {rpc_name} method."),
            &custom.request,
        )?;
        let path_field = self.path_field(&resource.fq_type);
        request.fields.insert(0, path_field);
        self.messages.push(request);
        let response = self.build_message(
            &format!("{rpc_name}Response"),
            format!("Response message for the {rpc_name} method."),
            &custom.response,
        )?;
        self.messages.push(response);
        let (verb, body) = match custom.method {
            CustomVerb::Post => ("post", Some("*".to_string())),
            CustomVerb::Get => ("get", None),
        };
        self.push_rpc(Rpc {
            name: rpc_name.clone(),
            comment: format!(
                "A custom {} method for {}.",
                to_pascal_case(&custom.name),
                resource.kind
            ),
            request: format!("{rpc_name}Request"),
            response: format!("{rpc_name}Response"),
            http: HttpRule {
                verb,
                path: format!(
                    "/{{path={}}}:{}",
                    self.service.item_wildcard_pattern(id),
                    custom.name
                ),
                body,
            },
            method_signature: None,
        });
        Ok(())
    }

    fn push_rpc(&mut self, rpc: Rpc) {
        self.imports.insert(ANNOTATIONS_IMPORT);
        if rpc.method_signature.is_some() {
            self.imports.insert(CLIENT_IMPORT);
        }
        self.rpcs.push(rpc);
    }

    /// The `{parent=...}` collection rule used by Create and List. Root
    /// resources bind their lowercased plural; children bind the parent item
    /// pattern and append their own collection segment.
    fn parent_collection_rule(&self, id: ResourceId) -> String {
        let resource = &self.service.resources[id];
        match resource.parents.first() {
            None => format!("/{{parent={}}}", resource.plural.to_lowercase()),
            Some(&parent_id) => format!(
                "/{{parent={}}}/{}",
                self.service.item_wildcard_pattern(parent_id),
                self.service.collection_name(id)
            ),
        }
    }

    // ── Generated fields ─────────────────────────────────────────────────────

    fn parent_field(&mut self, kind: &str) -> ProtoField {
        self.imports.insert(FIELD_BEHAVIOR_IMPORT);
        self.imports.insert(RESOURCE_IMPORT);
        ProtoField {
            name: "parent".to_string(),
            comment: format!("A field for the parent of {kind}."),
            type_name: "string".to_string(),
            number: FIELD_NUMBER_PARENT,
            repeated: false,
            options: vec![
                REQUIRED_OPTION.to_string(),
                "(google.api.resource_reference) = {}".to_string(),
            ],
        }
    }

    fn path_field(&mut self, fq_type: &str) -> ProtoField {
        self.imports.insert(FIELD_BEHAVIOR_IMPORT);
        self.imports.insert(RESOURCE_IMPORT);
        ProtoField {
            name: "path".to_string(),
            comment: "The globally unique identifier for the resource.".to_string(),
            type_name: "string".to_string(),
            number: FIELD_NUMBER_PATH,
            repeated: false,
            options: vec![
                REQUIRED_OPTION.to_string(),
                format!("(google.api.resource_reference) = {{ type: \"{fq_type}\" }}"),
            ],
        }
    }

    fn resource_field(&mut self, snake_kind: &str, message_name: &str) -> ProtoField {
        self.imports.insert(FIELD_BEHAVIOR_IMPORT);
        ProtoField {
            name: snake_kind.to_string(),
            comment: "The resource to perform the operation on.".to_string(),
            type_name: message_name.to_string(),
            number: FIELD_NUMBER_RESOURCE,
            repeated: false,
            options: vec![REQUIRED_OPTION.to_string()],
        }
    }
}

fn id_field() -> ProtoField {
    ProtoField {
        name: "id".to_string(),
        comment: "An id that uniquely identifies the resource within the collection.".to_string(),
        type_name: "string".to_string(),
        number: FIELD_NUMBER_ID,
        repeated: false,
        options: Vec::new(),
    }
}

fn update_mask_field() -> ProtoField {
    ProtoField {
        name: "update_mask".to_string(),
        comment: "The update mask for the resource.".to_string(),
        type_name: "google.protobuf.FieldMask".to_string(),
        number: FIELD_NUMBER_UPDATE_MASK,
        repeated: false,
        options: Vec::new(),
    }
}

fn results_field(plural: &str, message_name: &str) -> ProtoField {
    ProtoField {
        name: "results".to_string(),
        comment: format!("A list of {plural}."),
        type_name: message_name.to_string(),
        number: FIELD_NUMBER_RESOURCES,
        repeated: true,
        options: Vec::new(),
    }
}

fn page_token_field() -> ProtoField {
    ProtoField {
        name: "page_token".to_string(),
        comment: "The page token indicating the starting point of the page.".to_string(),
        type_name: "string".to_string(),
        number: FIELD_NUMBER_PAGE_TOKEN,
        repeated: false,
        options: Vec::new(),
    }
}

fn next_page_token_field() -> ProtoField {
    ProtoField {
        name: "next_page_token".to_string(),
        comment: "The page token indicating the ending point of this response.".to_string(),
        type_name: "string".to_string(),
        number: FIELD_NUMBER_NEXT_PAGE_TOKEN,
        repeated: false,
        options: Vec::new(),
    }
}

fn max_page_size_field() -> ProtoField {
    ProtoField {
        name: "max_page_size".to_string(),
        comment: "The maximum number of resources to return in a single page.".to_string(),
        type_name: "int32".to_string(),
        number: FIELD_NUMBER_MAX_PAGE_SIZE,
        repeated: false,
        options: Vec::new(),
    }
}

fn unreachable_field() -> ProtoField {
    ProtoField {
        name: "unreachable".to_string(),
        comment: "Unreachable resources.".to_string(),
        type_name: "string".to_string(),
        number: FIELD_NUMBER_UNREACHABLE,
        repeated: true,
        options: Vec::new(),
    }
}

// ── Rendering ────────────────────────────────────────────────────────────────

impl ProtoBuilder<'_> {
    fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("syntax = \"proto3\";\n\n");
        out.push_str(&format!(
            "package {};\n\n",
            to_snake_case(self.service.short_name())
        ));
        if !self.imports.is_empty() {
            for import in &self.imports {
                out.push_str(&format!("import \"{import}\";\n"));
            }
            out.push('\n');
        }
        out.push_str(&format!("// A service for {}.\n", self.service.name));
        out.push_str(&format!(
            "service {} {{\n",
            to_pascal_case(self.service.short_name())
        ));
        for (i, rpc) in self.rpcs.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            render_rpc(rpc, &mut out);
        }
        out.push_str("}\n");
        for message in &self.messages {
            out.push('\n');
            render_message(message, 0, &mut out);
        }
        out
    }
}

fn render_rpc(rpc: &Rpc, out: &mut String) {
    out.push_str(&format!("  // {}\n", rpc.comment));
    out.push_str(&format!(
        "  rpc {}({}) returns ({}) {{\n",
        rpc.name, rpc.request, rpc.response
    ));
    out.push_str("    option (google.api.http) = {\n");
    out.push_str(&format!("      {}: \"{}\"\n", rpc.http.verb, rpc.http.path));
    if let Some(body) = &rpc.http.body {
        out.push_str(&format!("      body: \"{body}\"\n"));
    }
    out.push_str("    };\n");
    if let Some(signature) = &rpc.method_signature {
        out.push_str(&format!(
            "    option (google.api.method_signature) = \"{signature}\";\n"
        ));
    }
    out.push_str("  }\n");
}

fn render_message(message: &ProtoMessage, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    out.push_str(&format!("{pad}// {}\n", message.comment));
    if message.fields.is_empty() && message.nested.is_empty() {
        out.push_str(&format!("{pad}message {} {{}}\n", message.name));
        return;
    }
    out.push_str(&format!("{pad}message {} {{\n", message.name));
    let mut first = true;
    for field in &message.fields {
        if !first {
            out.push('\n');
        }
        first = false;
        render_field(field, indent + 1, out);
    }
    for nested in &message.nested {
        if !first {
            out.push('\n');
        }
        first = false;
        render_message(nested, indent + 1, out);
    }
    out.push_str(&format!("{pad}}}\n"));
}

fn render_field(field: &ProtoField, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    out.push_str(&format!("{pad}// {}\n", field.comment));
    let repeated = if field.repeated { "repeated " } else { "" };
    let declaration = format!(
        "{pad}{repeated}{} {} = {}",
        field.type_name, field.name, field.number
    );
    match field.options.len() {
        0 => out.push_str(&format!("{declaration};\n")),
        1 => out.push_str(&format!("{declaration} [{}];\n", field.options[0])),
        _ => {
            out.push_str(&format!("{declaration} [\n"));
            let option_pad = "  ".repeat(indent + 1);
            for (i, option) in field.options.iter().enumerate() {
                let comma = if i + 1 < field.options.len() { "," } else { "" };
                out.push_str(&format!("{option_pad}{option}{comma}\n"));
            }
            out.push_str(&format!("{pad}];\n"));
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

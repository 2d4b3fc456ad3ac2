//! Resource schema types and YAML/JSON parsers
//!
//! Deserialises a resource definition file into [`Service`]. The model is
//! pure data: resolution, validation, and generation live in their own
//! modules and never mutate it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Service ──────────────────────────────────────────────────────────────────

/// The full contents of a resource definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    /// Dot-delimited service name, e.g. `bookstore.example.com`.
    pub name: String,
    /// Base server URL, e.g. `http://localhost:8081`.
    #[serde(default)]
    pub url: String,
    /// Declared resources.
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Shared object schemas, referencable from any property.
    #[serde(default)]
    pub schemas: Vec<SchemaDef>,
}

impl Service {
    /// Parse from a YAML string (the contents of a `.yaml` definition file).
    pub fn from_yaml(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    /// Parse from a JSON string (the contents of a `.json` definition file).
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// The service name segment before the first `.`, used for output file
    /// naming (`bookstore.example.com` → `bookstore`).
    pub fn short_name(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }
}

// ── Resource ─────────────────────────────────────────────────────────────────

/// One declared resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Singular type name, lowercase-leading (e.g. `book`, `bookEdition`).
    pub kind: String,
    /// Collection name (e.g. `books`, `book-editions`).
    pub plural: String,
    /// Parent kind references. Unqualified names are resolved against the
    /// owning service; a qualified reference is `service-name/kind`.
    #[serde(default)]
    pub parents: Vec<String>,
    /// Properties keyed by name.
    #[serde(default)]
    pub properties: BTreeMap<String, Property>,
    /// Enabled standard methods.
    #[serde(default)]
    pub methods: Methods,
}

/// A shared object schema — a reusable structure that is not a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDef {
    /// Schema name, referenced by object properties (e.g. `author`).
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Property>,
}

// ── Properties ───────────────────────────────────────────────────────────────

/// One property of a resource, shared schema, or inline object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    /// Wire field tag and ordering key. Positive, unique per message, and
    /// outside the reserved 10000–10019 range.
    pub number: u32,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    /// The property's type, discriminated by the `type` key.
    #[serde(flatten)]
    pub property_type: PropertyType,
}

/// The closed set of property types.
///
/// Adding a scalar here is a compile-time-checked change: both generators
/// match exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Bool,
    Int32,
    Int64,
    Float,
    Double,
    /// `type: array` — the item type is described recursively under `items`.
    Array { items: Box<PropertyType> },
    /// `type: object` — either a `reference` to a shared schema / resource
    /// kind, or inline `properties`. Setting both is a validation error.
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        properties: BTreeMap<String, Property>,
    },
}

/// Sort a property map by ascending field number.
///
/// Field order in both generated artifacts is the field-number order, never
/// the map's key order.
pub fn properties_by_number(props: &BTreeMap<String, Property>) -> Vec<(&str, &Property)> {
    let mut sorted: Vec<(&str, &Property)> =
        props.iter().map(|(n, p)| (n.as_str(), p)).collect();
    sorted.sort_by_key(|(_, p)| p.number);
    sorted
}

// ── Methods ──────────────────────────────────────────────────────────────────

/// Which standard methods a resource supports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Methods {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<CreateMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<GetMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<UpdateMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<DeleteMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply: Option<ApplyMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom: Vec<CustomMethod>,
}

/// `methods.create` — POST on the parent collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateMethod {
    /// Disable client-provided ids. When false (the default) the Create
    /// request carries a settable `id` field.
    #[serde(default)]
    pub non_client_settable_id: bool,
}

/// `methods.get` — GET on the item path. Injected during resolution when
/// absent: every resource is individually retrievable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetMethod {}

/// `methods.update` — PATCH with an update mask.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateMethod {}

/// `methods.delete` — DELETE returning an empty response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteMethod {}

/// `methods.list` — GET on the parent collection with pagination.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListMethod {
    /// Add a repeated `unreachable` field to the List response for
    /// collections that may span partially unavailable backends.
    #[serde(default)]
    pub has_unreachable_resources: bool,
}

/// `methods.apply` — PUT, insert-if-absent-else-fully-replace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyMethod {}

/// One `methods.custom` entry — a non-standard verb on the item path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomMethod {
    /// Method name as it appears in the URL suffix (e.g. `archive` →
    /// `.../books/{book}:archive`).
    pub name: String,
    /// HTTP verb; POST unless overridden.
    #[serde(default)]
    pub method: CustomVerb,
    /// Request properties beyond the implicit `path` field.
    #[serde(default)]
    pub request: BTreeMap<String, Property>,
    /// Response properties. Empty means an empty response object.
    #[serde(default)]
    pub response: BTreeMap<String, Property>,
}

/// HTTP verb for a custom method. GET is the only supported override.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CustomVerb {
    #[default]
    Post,
    Get,
}

// ── Generated field numbers ──────────────────────────────────────────────────

/// Field numbers assigned to generated fields. Keeping user properties out of
/// this range lets generated fields keep stable numbers across recompiles no
/// matter how the schema grows.
pub const RESERVED_FIELD_NUMBERS: std::ops::RangeInclusive<u32> = 10000..=10019;

pub const FIELD_NUMBER_PAGE_TOKEN: u32 = 10010;
pub const FIELD_NUMBER_NEXT_PAGE_TOKEN: u32 = 10011;
pub const FIELD_NUMBER_UPDATE_MASK: u32 = 10012;
pub const FIELD_NUMBER_PARENT: u32 = 10013;
pub const FIELD_NUMBER_ID: u32 = 10014;
pub const FIELD_NUMBER_RESOURCE: u32 = 10015;
pub const FIELD_NUMBER_RESOURCES: u32 = 10016;
pub const FIELD_NUMBER_MAX_PAGE_SIZE: u32 = 10017;
pub const FIELD_NUMBER_PATH: u32 = 10018;
pub const FIELD_NUMBER_UNREACHABLE: u32 = 10019;

// ── Name helpers ─────────────────────────────────────────────────────────────

/// Convert a kebab-case or lowercase name to PascalCase.
///
/// ```
/// use apidef_codegen::schema::to_pascal_case;
/// assert_eq!(to_pascal_case("book"), "Book");
/// assert_eq!(to_pascal_case("book-edition"), "BookEdition");
/// assert_eq!(to_pascal_case("bookEdition"), "BookEdition");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    s.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Convert a kebab-case or camelCase name to snake_case.
///
/// ```
/// use apidef_codegen::schema::to_snake_case;
/// assert_eq!(to_snake_case("book-edition"), "book_edition");
/// assert_eq!(to_snake_case("bookEdition"), "book_edition");
/// assert_eq!(to_snake_case("book"), "book");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c == '-' {
            out.push('_');
        } else if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

// ── Tests ────────────────────────────────────────────────────────────────────

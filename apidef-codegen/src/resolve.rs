//! Resource graph resolution
//!
//! Turns a validated [`Service`] into a [`ResolvedService`]: an arena of
//! resources with parent references resolved to graph edges, generated
//! common fields injected, and a default Get method added. The graph is
//! constructed once per compiler run and immutable thereafter; both
//! generators hold read references into it.

use std::collections::BTreeMap;

use crate::error::{CodegenError, CodegenResult};
use crate::schema::{
    GetMethod, Methods, Property, PropertyType, Service, FIELD_NUMBER_ID, FIELD_NUMBER_PATH,
};

/// Index of a resolved resource within [`ResolvedService::resources`].
pub type ResourceId = usize;

/// The resolved resource graph for one service.
#[derive(Debug, Clone)]
pub struct ResolvedService {
    /// Dot-delimited service name.
    pub name: String,
    /// Base server URL.
    pub url: String,
    /// Resources in declaration order. Generators iterate this, never
    /// [`Self::by_type`], so output order follows the definition file.
    pub resources: Vec<ResolvedResource>,
    /// Fully-qualified type (`service-name/kind`) to arena index.
    pub by_type: BTreeMap<String, ResourceId>,
    /// Shared object schemas by name.
    pub schemas: BTreeMap<String, BTreeMap<String, Property>>,
}

/// One node of the resolved graph.
#[derive(Debug, Clone)]
pub struct ResolvedResource {
    /// Fully-qualified type, `service-name/kind`.
    pub fq_type: String,
    /// Singular kind, as declared.
    pub kind: String,
    /// Collection name, as declared.
    pub plural: String,
    /// Resolved parent edges, in declaration order.
    pub parents: Vec<ResourceId>,
    /// Resolved child edges, in the children's declaration order.
    pub children: Vec<ResourceId>,
    /// User properties plus the generated `path` and `id` fields.
    pub properties: BTreeMap<String, Property>,
    /// Enabled methods, with the default Get injected.
    pub methods: Methods,
}

/// Resolve a service into its resource graph.
///
/// Fails on the first unresolvable parent reference; no partial graph is
/// produced.
pub fn resolve(service: &Service) -> CodegenResult<ResolvedService> {
    let mut resources: Vec<ResolvedResource> = Vec::with_capacity(service.resources.len());
    let mut by_type: BTreeMap<String, ResourceId> = BTreeMap::new();

    // Index every resource before touching parent references, so forward
    // and self references resolve without recursion.
    for resource in &service.resources {
        let fq_type = format!("{}/{}", service.name, resource.kind);
        by_type.insert(fq_type.clone(), resources.len());

        let mut properties = resource.properties.clone();
        properties.insert("path".to_string(), generated_string_field(FIELD_NUMBER_PATH));
        properties.insert("id".to_string(), generated_string_field(FIELD_NUMBER_ID));

        let mut methods = resource.methods.clone();
        if methods.get.is_none() {
            methods.get = Some(GetMethod::default());
        }

        resources.push(ResolvedResource {
            fq_type,
            kind: resource.kind.clone(),
            plural: resource.plural.clone(),
            parents: Vec::new(),
            children: Vec::new(),
            properties,
            methods,
        });
    }

    for (id, resource) in service.resources.iter().enumerate() {
        for parent_ref in &resource.parents {
            let qualified = if parent_ref.contains('/') {
                parent_ref.clone()
            } else {
                format!("{}/{}", service.name, parent_ref)
            };
            let parent_id = *by_type.get(&qualified).ok_or_else(|| {
                // Report the qualified type that was actually looked up
                CodegenError::ParentNotFound {
                    parent: qualified.clone(),
                    resource: resource.kind.clone(),
                }
            })?;
            resources[id].parents.push(parent_id);
            resources[parent_id].children.push(id);
        }
    }

    let schemas = service
        .schemas
        .iter()
        .map(|s| (s.name.clone(), s.properties.clone()))
        .collect();

    Ok(ResolvedService {
        name: service.name.clone(),
        url: service.url.clone(),
        resources,
        by_type,
        schemas,
    })
}

fn generated_string_field(number: u32) -> Property {
    Property {
        number,
        required: false,
        read_only: true,
        property_type: PropertyType::String,
    }
}

// ── Path templates ────────────────────────────────────────────────────────────

impl ResolvedService {
    /// The service name segment before the first `.`, used to derive
    /// identifiers in the generated artifacts.
    pub fn short_name(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    /// Look up a resource by its singular kind.
    pub fn resource_by_kind(&self, kind: &str) -> Option<&ResolvedResource> {
        let fq_type = format!("{}/{}", self.name, kind);
        self.by_type.get(&fq_type).map(|&id| &self.resources[id])
    }

    /// The URL collection segment for a resource. When the declared plural
    /// is prefixed by the first parent's kind plus `-`, that prefix is
    /// stripped, so `book` / `book-editions` yields `editions`. No prefix
    /// match means no stripping.
    pub fn collection_name(&self, id: ResourceId) -> String {
        let resource = &self.resources[id];
        if let Some(&parent_id) = resource.parents.first() {
            let parent_kind = &self.resources[parent_id].kind;
            if let Some(stripped) = resource.plural.strip_prefix(&format!("{parent_kind}-")) {
                return stripped.to_string();
            }
        }
        resource.plural.clone()
    }

    /// The first-parent ancestry of a resource, root first, ending with the
    /// resource itself. Both generators route from this chain.
    pub fn first_parent_chain(&self, id: ResourceId) -> Vec<ResourceId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(&parent_id) = self.resources[current].parents.first() {
            // A parent cycle would recur forever; stop composing instead.
            if chain.contains(&parent_id) {
                break;
            }
            chain.insert(0, parent_id);
            current = parent_id;
        }
        chain
    }

    /// Wildcard item pattern for proto HTTP rules, e.g.
    /// `publishers/*/books/*`.
    pub fn item_wildcard_pattern(&self, id: ResourceId) -> String {
        let segments: Vec<String> = self
            .first_parent_chain(id)
            .iter()
            .map(|&rid| self.collection_name(rid))
            .collect();
        format!("{}/*", segments.join("/*/"))
    }

    /// Named-placeholder item template for OpenAPI paths, e.g.
    /// `publishers/{publisher}/books/{book}`.
    pub fn item_path_template(&self, id: ResourceId) -> String {
        self.first_parent_chain(id)
            .iter()
            .map(|&rid| {
                format!(
                    "{}/{{{}}}",
                    self.collection_name(rid),
                    self.resources[rid].kind
                )
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Collection template for OpenAPI Create/List paths: the item template
    /// of the first parent, plus this resource's collection segment.
    pub fn collection_path_template(&self, id: ResourceId) -> String {
        match self.resources[id].parents.first() {
            None => self.collection_name(id),
            Some(&parent_id) => format!(
                "{}/{}",
                self.item_path_template(parent_id),
                self.collection_name(id)
            ),
        }
    }

    /// All path patterns for a resource, one per parent chain. Multi-parent
    /// resources cross-product every parent's own pattern set; the first
    /// entry is always the first-parent chain used for routing.
    pub fn pattern_strings(&self, id: ResourceId) -> Vec<String> {
        self.pattern_strings_inner(id, &mut Vec::new())
    }

    fn pattern_strings_inner(&self, id: ResourceId, visiting: &mut Vec<ResourceId>) -> Vec<String> {
        let resource = &self.resources[id];
        let base = format!("{}/{{{}}}", self.collection_name(id), resource.kind);
        if resource.parents.is_empty() || visiting.contains(&id) {
            return vec![base];
        }
        visiting.push(id);
        let mut patterns = Vec::new();
        for &parent_id in &resource.parents {
            for parent_pattern in self.pattern_strings_inner(parent_id, visiting) {
                patterns.push(format!("{parent_pattern}/{base}"));
            }
        }
        visiting.pop();
        patterns
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

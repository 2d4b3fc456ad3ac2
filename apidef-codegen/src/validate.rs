//! Service definition validator
//!
//! Checks a [`Service`] for structural and semantic errors before any
//! artifact is generated.

use std::collections::BTreeMap;

use crate::schema::{Property, PropertyType, Service, RESERVED_FIELD_NUMBERS};

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Human-readable description of the problem.
    pub message: String,
    /// Location in the definition file that caused the error
    /// (e.g. `resources[0].properties[title].number`).
    pub location: String,
    /// Whether this blocks generation (`Error`) or is advisory (`Warning`).
    pub severity: Severity,
}

/// Severity of a [`ValidationError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    /// Blocks generation — the artifacts would be invalid or internally
    /// inconsistent.
    Error,
    /// Advisory — artifacts can still be generated but may not behave as
    /// intended.
    Warning,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        write!(f, "[{}] {}: {}", tag, self.location, self.message)
    }
}

/// Field names injected into every resource message during resolution.
/// User properties must not shadow them.
pub const GENERATED_RESOURCE_FIELDS: &[&str] = &["path", "id"];

/// Validate a [`Service`] and return all problems found.
///
/// An empty `Vec` means the definition is valid and generation may proceed.
/// Any entry with [`Severity::Error`] should block generation.
pub fn validate(service: &Service) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> = Vec::new();

    validate_service(service, &mut errors);
    validate_resources(service, &mut errors);
    validate_schemas(service, &mut errors);

    errors
}

/// Returns `true` if `validate()` produces no `Error`-severity issues.
pub fn is_valid(service: &Service) -> bool {
    !validate(service)
        .iter()
        .any(|e| e.severity == Severity::Error)
}

// ── Internal validators ────────────────────────────────────────────────────────

fn validate_service(service: &Service, errors: &mut Vec<ValidationError>) {
    if service.name.is_empty() {
        errors.push(ValidationError {
            message: "service name must not be empty".to_string(),
            location: "name".to_string(),
            severity: Severity::Error,
        });
    }
}

fn validate_resources(service: &Service, errors: &mut Vec<ValidationError>) {
    let mut seen_kinds: Vec<&str> = Vec::new();

    for (idx, resource) in service.resources.iter().enumerate() {
        let loc = format!("resources[{idx}]");

        // Kind must be non-empty
        if resource.kind.is_empty() {
            errors.push(ValidationError {
                message: "resource kind must not be empty".to_string(),
                location: loc.clone(),
                severity: Severity::Error,
            });
            continue; // Can't do further checks without a kind
        }

        // Kind becomes message names and URL segments, so its shape is fixed
        if !valid_kind(&resource.kind) {
            errors.push(ValidationError {
                message: format!(
                    "kind '{}' must start with a lowercase letter and contain only letters and digits",
                    resource.kind
                ),
                location: format!("{loc}.kind"),
                severity: Severity::Error,
            });
        }

        // Duplicate kinds
        if seen_kinds.contains(&resource.kind.as_str()) {
            errors.push(ValidationError {
                message: format!("duplicate resource kind '{}'", resource.kind),
                location: format!("{loc}.kind"),
                severity: Severity::Error,
            });
        } else {
            seen_kinds.push(&resource.kind);
        }

        if resource.plural.is_empty() {
            errors.push(ValidationError {
                message: format!(
                    "resource '{}' must declare a plural collection name",
                    resource.kind
                ),
                location: format!("{loc}.plural"),
                severity: Severity::Error,
            });
        }

        for (pidx, parent) in resource.parents.iter().enumerate() {
            if parent.is_empty() {
                errors.push(ValidationError {
                    message: "parent reference must not be empty".to_string(),
                    location: format!("{loc}.parents[{pidx}]"),
                    severity: Severity::Error,
                });
            }
        }

        // Warn if no properties
        if resource.properties.is_empty() {
            errors.push(ValidationError {
                message: format!(
                    "resource '{}' has no properties — its schema will only carry generated fields",
                    resource.kind
                ),
                location: format!("{loc}.properties"),
                severity: Severity::Warning,
            });
        }

        validate_properties(
            &resource.properties,
            &loc,
            GENERATED_RESOURCE_FIELDS,
            errors,
        );

        validate_custom_methods(resource, &loc, errors);
    }
}

fn validate_custom_methods(
    resource: &crate::schema::Resource,
    loc: &str,
    errors: &mut Vec<ValidationError>,
) {
    use crate::schema::CustomVerb;

    let mut seen_names: Vec<&str> = Vec::new();

    for (cidx, custom) in resource.methods.custom.iter().enumerate() {
        let cloc = format!("{loc}.methods.custom[{cidx}]");

        if custom.name.is_empty() {
            errors.push(ValidationError {
                message: "custom method name must not be empty".to_string(),
                location: format!("{cloc}.name"),
                severity: Severity::Error,
            });
        }

        // Duplicate names would emit two identically-named RPCs and collide
        // on the shared `{item}:{name}` path
        if seen_names.contains(&custom.name.as_str()) {
            errors.push(ValidationError {
                message: format!("duplicate custom method name '{}'", custom.name),
                location: format!("{cloc}.name"),
                severity: Severity::Error,
            });
        } else if !custom.name.is_empty() {
            seen_names.push(&custom.name);
        }

        // GET carries no body, so declared request properties go nowhere
        if custom.method == CustomVerb::Get && !custom.request.is_empty() {
            errors.push(ValidationError {
                message: format!(
                    "custom method '{}' uses GET but declares request properties — they are not carried by the request URL",
                    custom.name
                ),
                location: format!("{cloc}.request"),
                severity: Severity::Warning,
            });
        }

        // The request message gets a generated `path` field
        validate_properties(&custom.request, &format!("{cloc}.request"), &["path"], errors);
        validate_properties(&custom.response, &format!("{cloc}.response"), &[], errors);
    }
}

fn validate_schemas(service: &Service, errors: &mut Vec<ValidationError>) {
    let kinds: Vec<&str> = service.resources.iter().map(|r| r.kind.as_str()).collect();
    let mut seen_names: Vec<&str> = Vec::new();

    for (idx, schema) in service.schemas.iter().enumerate() {
        let loc = format!("schemas[{idx}]");

        if schema.name.is_empty() {
            errors.push(ValidationError {
                message: "schema name must not be empty".to_string(),
                location: loc.clone(),
                severity: Severity::Error,
            });
            continue;
        }

        // Schemas and resource kinds share one reference namespace
        if kinds.contains(&schema.name.as_str()) {
            errors.push(ValidationError {
                message: format!("schema name '{}' collides with a resource kind", schema.name),
                location: format!("{loc}.name"),
                severity: Severity::Error,
            });
        }

        if seen_names.contains(&schema.name.as_str()) {
            errors.push(ValidationError {
                message: format!("duplicate schema name '{}'", schema.name),
                location: format!("{loc}.name"),
                severity: Severity::Error,
            });
        } else {
            seen_names.push(&schema.name);
        }

        validate_properties(&schema.properties, &loc, &[], errors);
    }
}

/// Validate a property map, recursing into inline objects and array items.
///
/// `reserved_names` are field names the generators inject into the enclosing
/// message; user properties with those names are rejected.
fn validate_properties(
    props: &BTreeMap<String, Property>,
    loc: &str,
    reserved_names: &[&str],
    errors: &mut Vec<ValidationError>,
) {
    let mut seen_numbers: Vec<u32> = Vec::new();

    for (name, prop) in props {
        let ploc = format!("{loc}.properties[{name}]");

        if reserved_names.contains(&name.as_str()) {
            errors.push(ValidationError {
                message: format!("property name '{name}' collides with a generated field"),
                location: ploc.clone(),
                severity: Severity::Error,
            });
        }

        if prop.number == 0 {
            errors.push(ValidationError {
                message: "property number must be positive".to_string(),
                location: format!("{ploc}.number"),
                severity: Severity::Error,
            });
        } else if RESERVED_FIELD_NUMBERS.contains(&prop.number) {
            errors.push(ValidationError {
                message: format!(
                    "property number {} is inside the {}-{} range reserved for generated fields",
                    prop.number,
                    RESERVED_FIELD_NUMBERS.start(),
                    RESERVED_FIELD_NUMBERS.end()
                ),
                location: format!("{ploc}.number"),
                severity: Severity::Error,
            });
        }

        if seen_numbers.contains(&prop.number) {
            errors.push(ValidationError {
                message: format!("duplicate property number {}", prop.number),
                location: format!("{ploc}.number"),
                severity: Severity::Error,
            });
        } else {
            seen_numbers.push(prop.number);
        }

        validate_property_type(&prop.property_type, &ploc, errors);
    }
}

fn validate_property_type(
    property_type: &PropertyType,
    loc: &str,
    errors: &mut Vec<ValidationError>,
) {
    match property_type {
        PropertyType::Object {
            reference,
            properties,
        } => {
            if reference.is_some() && !properties.is_empty() {
                errors.push(ValidationError {
                    message: "cannot set both reference and properties on an object property"
                        .to_string(),
                    location: loc.to_string(),
                    severity: Severity::Error,
                });
            }
            validate_properties(properties, loc, &[], errors);
        }
        PropertyType::Array { items } => validate_property_type(items, loc, errors),
        _ => {}
    }
}

fn valid_kind(kind: &str) -> bool {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Service;

    const VALID_YAML: &str = r#"
name: library.example.com
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
      create: {}
      get: {}
      update: {}
      delete: {}
      list: {}
      custom:
        - name: archive
          method: post
          request:
            reason:
              type: string
              number: 1
schemas:
  - name: author
    properties:
      first_name:
        type: string
        number: 1
"#;

    fn valid_service() -> Service {
        Service::from_yaml(VALID_YAML).unwrap()
    }

    #[test]
    fn valid_definition_has_no_errors() {
        let errs = validate(&valid_service());
        let error_errs: Vec<_> = errs
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .collect();
        assert!(error_errs.is_empty(), "Unexpected errors: {error_errs:?}");
    }

    #[test]
    fn is_valid_returns_true_for_clean_definition() {
        assert!(is_valid(&valid_service()));
    }

    #[test]
    fn detects_empty_service_name() {
        let yaml = VALID_YAML.replace("name: library.example.com", "name: \"\"");
        let service = Service::from_yaml(&yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("service name"));
        assert!(has_err, "Should detect empty service name:\n{errs:?}");
    }

    #[test]
    fn detects_uppercase_kind() {
        let yaml = VALID_YAML.replace("kind: book", "kind: Book");
        let service = Service::from_yaml(&yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("lowercase letter"));
        assert!(has_err, "Should reject uppercase-leading kind:\n{errs:?}");
    }

    #[test]
    fn detects_kind_with_punctuation() {
        let yaml = VALID_YAML.replace("kind: book", "kind: book-edition");
        let service = Service::from_yaml(&yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("letters and digits"));
        assert!(has_err, "Should reject punctuation in kind:\n{errs:?}");
    }

    #[test]
    fn detects_duplicate_kind() {
        let mut service = valid_service();
        let duplicate = service.resources[1].clone();
        service.resources.push(duplicate);
        let errs = validate(&service);
        let has_err = errs
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("duplicate resource kind"));
        assert!(has_err, "Should detect duplicate kind:\n{errs:?}");
    }

    #[test]
    fn detects_missing_plural() {
        let yaml = VALID_YAML.replace("plural: books", "plural: \"\"");
        let service = Service::from_yaml(&yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("plural"));
        assert!(has_err, "Should detect missing plural:\n{errs:?}");
    }

    #[test]
    fn detects_zero_property_number() {
        let yaml = VALID_YAML.replace("number: 2", "number: 0");
        let service = Service::from_yaml(&yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("must be positive"));
        assert!(has_err, "Should detect zero property number:\n{errs:?}");
    }

    #[test]
    fn detects_reserved_property_number() {
        let yaml = VALID_YAML.replace("number: 2", "number: 10014");
        let service = Service::from_yaml(&yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("reserved for generated"));
        assert!(has_err, "Should detect reserved property number:\n{errs:?}");
    }

    #[test]
    fn detects_duplicate_property_number() {
        let yaml = VALID_YAML.replace("number: 2", "number: 1");
        let service = Service::from_yaml(&yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("duplicate property number"));
        assert!(has_err, "Should detect duplicate property number:\n{errs:?}");
    }

    #[test]
    fn detects_property_shadowing_generated_field() {
        let yaml = r#"
name: library.example.com
resources:
  - kind: book
    plural: books
    properties:
      path:
        type: string
        number: 1
"#;
        let service = Service::from_yaml(yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("generated field"));
        assert!(has_err, "Should reject a user-defined 'path':\n{errs:?}");
    }

    #[test]
    fn detects_reference_with_inline_properties() {
        let yaml = VALID_YAML.replace(
            "        reference: author",
            "        reference: author\n        properties:\n          full_name:\n            type: string\n            number: 1",
        );
        let service = Service::from_yaml(&yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs.iter().any(|e| {
            e.severity == Severity::Error
                && e.message.contains("cannot set both reference and properties")
        });
        assert!(has_err, "Should reject reference + properties:\n{errs:?}");
    }

    #[test]
    fn detects_empty_custom_method_name() {
        let yaml = VALID_YAML.replace("- name: archive", "- name: \"\"");
        let service = Service::from_yaml(&yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("custom method name"));
        assert!(has_err, "Should detect empty custom method name:\n{errs:?}");
    }

    #[test]
    fn detects_duplicate_custom_method_name() {
        let mut service = valid_service();
        let duplicate = service.resources[1].methods.custom[0].clone();
        service.resources[1].methods.custom.push(duplicate);
        let errs = validate(&service);
        let has_err = errs.iter().any(|e| {
            e.severity == Severity::Error && e.message.contains("duplicate custom method name")
        });
        assert!(has_err, "Should detect duplicate custom method name:\n{errs:?}");
    }

    #[test]
    fn detects_schema_colliding_with_kind() {
        let yaml = VALID_YAML.replace("- name: author", "- name: book");
        let service = Service::from_yaml(&yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("collides with a resource kind"));
        assert!(has_err, "Should detect schema/kind collision:\n{errs:?}");
    }

    #[test]
    fn warns_on_get_custom_method_with_request() {
        let yaml = VALID_YAML.replace("method: post", "method: get");
        let service = Service::from_yaml(&yaml).unwrap();
        let errs = validate(&service);
        let has_warn = errs
            .iter()
            .any(|e| e.severity == Severity::Warning && e.message.contains("uses GET"));
        assert!(has_warn, "Should warn about GET with request body:\n{errs:?}");
    }

    #[test]
    fn warns_on_resource_without_properties() {
        let yaml = r#"
name: library.example.com
resources:
  - kind: shelf
    plural: shelves
"#;
        let service = Service::from_yaml(yaml).unwrap();
        let errs = validate(&service);
        let has_warn = errs
            .iter()
            .any(|e| e.severity == Severity::Warning && e.message.contains("has no properties"));
        assert!(has_warn, "Should warn about empty resource:\n{errs:?}");
    }

    #[test]
    fn nested_property_numbers_are_checked() {
        let yaml = r#"
name: library.example.com
resources:
  - kind: book
    plural: books
    properties:
      dimensions:
        type: object
        number: 1
        properties:
          height:
            type: float
            number: 0
"#;
        let service = Service::from_yaml(yaml).unwrap();
        let errs = validate(&service);
        let has_err = errs.iter().any(|e| {
            e.severity == Severity::Error
                && e.location.contains("properties[dimensions].properties[height]")
        });
        assert!(has_err, "Should recurse into inline objects:\n{errs:?}");
    }

    #[test]
    fn display_format() {
        let e = ValidationError {
            message: "something wrong".to_string(),
            location: "resources[0].kind".to_string(),
            severity: Severity::Error,
        };
        let s = format!("{e}");
        assert!(s.contains("[ERROR]"), "Display should show [ERROR]:\n{s}");
        assert!(
            s.contains("resources[0].kind"),
            "Display should show location:\n{s}"
        );
    }
}

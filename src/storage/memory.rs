use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::types::TemplateDescription;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryMetadata {
    pub total_owners: usize,
    pub total_templates: usize,
    pub local_templates: usize,
}

/// In-memory project template registry, keyed by owning package.
///
/// Templates keep their insertion order within an owner. Owners iterate
/// in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Vec<TemplateDescription>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a template to `owner`'s list, creating the list if needed.
    ///
    /// Duplicate bindings are allowed here.
    pub fn add(&mut self, owner: &str, template: TemplateDescription) {
        self.templates
            .entry(owner.to_string())
            .or_default()
            .push(template);
    }

    /// Templates registered for `owner`; empty when the owner is unknown.
    pub fn get(&self, owner: &str) -> &[TemplateDescription] {
        self.templates
            .get(owner)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Mutable list for `owner`, created empty if absent.
    pub fn get_mut(&mut self, owner: &str) -> &mut Vec<TemplateDescription> {
        self.templates.entry(owner.to_string()).or_default()
    }

    /// Add `template` under its own package unless that package already
    /// registered a template with the same binding.
    ///
    /// Returns whether the template was added.
    pub fn add_if_binding_absent(&mut self, template: TemplateDescription) -> bool {
        let existing = self.get_mut(template.package());
        if existing.iter().any(|t| t.binding() == template.binding()) {
            return false;
        }
        existing.push(template);
        true
    }

    /// Number of distinct owners
    pub fn size(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn total_templates(&self) -> usize {
        self.templates.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TemplateDescription])> {
        self.templates
            .iter()
            .map(|(owner, list)| (owner.as_str(), list.as_slice()))
    }

    pub fn metadata(&self) -> RegistryMetadata {
        RegistryMetadata {
            total_owners: self.size(),
            total_templates: self.total_templates(),
            local_templates: self.get(crate::types::LOCAL_OWNER).len(),
        }
    }

    /// Serialize as `{ owner: [ {package, binding, title, description}, ... ] }`.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (owner, list) in &self.templates {
            let array = list
                .iter()
                .map(|template| serde_json::to_value(template).unwrap_or(Value::Null))
                .collect();
            object.insert(owner.clone(), Value::Array(array));
        }
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LOCAL_OWNER;
    use serde_json::json;

    fn template(package: &str, binding: &str) -> TemplateDescription {
        TemplateDescription::new(
            package,
            binding,
            format!("Title {}", binding),
            format!("Description of {}.", binding),
        )
    }

    #[test]
    fn test_registry_creation() {
        let registry = TemplateRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.size(), 0);
        assert_eq!(registry.total_templates(), 0);
    }

    #[test]
    fn test_add_preserves_order() {
        let mut registry = TemplateRegistry::new();
        registry.add("demo", template("demo", "b"));
        registry.add("demo", template("demo", "a"));
        registry.add("demo", template("demo", "c"));

        let bindings: Vec<&str> = registry.get("demo").iter().map(|t| t.binding()).collect();
        assert_eq!(bindings, vec!["b", "a", "c"]);
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_add_allows_duplicate_bindings() {
        let mut registry = TemplateRegistry::new();
        registry.add("demo", template("demo", "same"));
        registry.add("demo", template("demo", "same"));
        assert_eq!(registry.get("demo").len(), 2);
    }

    #[test]
    fn test_get_unknown_owner_is_empty() {
        let registry = TemplateRegistry::new();
        assert!(registry.get("nobody").is_empty());
    }

    #[test]
    fn test_get_mut_creates_owner() {
        let mut registry = TemplateRegistry::new();
        registry.get_mut("demo").push(template("demo", "x"));
        assert_eq!(registry.size(), 1);
        assert_eq!(registry.get("demo")[0].binding(), "x");
    }

    #[test]
    fn test_add_if_binding_absent_first_wins() {
        let mut registry = TemplateRegistry::new();
        let package_version = TemplateDescription::new("devtools", "create", "Mine", "Package version.");
        registry.add("devtools", package_version.clone());

        assert!(!registry.add_if_binding_absent(template("devtools", "create")));
        assert_eq!(registry.get("devtools"), &[package_version]);

        assert!(registry.add_if_binding_absent(template("devtools", "other")));
        assert_eq!(registry.get("devtools").len(), 2);
    }

    #[test]
    fn test_add_if_binding_absent_is_package_scoped() {
        let mut registry = TemplateRegistry::new();
        registry.add("somepkg", template("somepkg", "create"));

        assert!(registry.add_if_binding_absent(template("devtools", "create")));
        assert_eq!(registry.size(), 2);
    }

    #[test]
    fn test_metadata() {
        let mut registry = TemplateRegistry::new();
        registry.add("a", template("a", "one"));
        registry.add("a", template("a", "two"));
        registry.add(LOCAL_OWNER, template(LOCAL_OWNER, "mine"));

        let metadata = registry.metadata();
        assert_eq!(metadata.total_owners, 2);
        assert_eq!(metadata.total_templates, 3);
        assert_eq!(metadata.local_templates, 1);
    }

    #[test]
    fn test_to_json() {
        let mut registry = TemplateRegistry::new();
        registry.add("demo", TemplateDescription::new("demo", "make", "Make Thing", "Builds a thing."));
        registry.add("demo", TemplateDescription::new("demo", "other", "Other", "Another."));

        assert_eq!(
            registry.to_json(),
            json!({
                "demo": [
                    {"package": "demo", "binding": "make", "title": "Make Thing", "description": "Builds a thing."},
                    {"package": "demo", "binding": "other", "title": "Other", "description": "Another."}
                ]
            })
        );
    }

    #[test]
    fn test_to_json_empty() {
        assert_eq!(TemplateRegistry::new().to_json(), json!({}));
    }
}

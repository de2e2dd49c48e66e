use serde::Serialize;
use std::collections::BTreeMap;

/// Owner used for templates read from the user's local template file.
pub const LOCAL_OWNER: &str = "(local)";

/// Field name -> value for one parsed DCF block.
pub type FieldMap = BTreeMap<String, String>;

/// One validated project template.
///
/// Instances are only produced by validation or by the built-in defaults,
/// so every field is a non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateDescription {
    package: String,
    binding: String,
    title: String,
    description: String,
}

impl TemplateDescription {
    pub(crate) fn new(
        package: impl Into<String>,
        binding: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            binding: binding.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// Package that declared this template, or [`LOCAL_OWNER`]
    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn binding(&self) -> &str {
        &self.binding
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Single-line summary for terminal display
    pub fn summary(&self) -> String {
        format!("{}::{} | {}", self.package, self.binding, self.title)
    }
}

/// A package found by a [`crate::scanner::PackageSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    /// Installation directory of the package
    pub path: std::path::PathBuf,
}

impl InstalledPackage {
    pub fn new(name: impl Into<String>, path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

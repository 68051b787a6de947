use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::plugin_system::dependency::DependencyConstraint;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::version::Version;
use crate::stage_manager::BootStage;

/// Values applied to metadata fields a plugin leaves out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorDefaults {
    pub description: String,
    pub authors: Vec<String>,
    pub server: String,
    pub shared: String,
    pub client: String,
    pub load_order: Vec<String>,
}

impl Default for DescriptorDefaults {
    fn default() -> Self {
        Self {
            description: String::new(),
            authors: Vec::new(),
            server: String::new(),
            shared: String::new(),
            client: String::new(),
            load_order: BootStage::ALL.iter().map(|stage| stage.id().to_string()).collect(),
        }
    }
}

/// Auto-download and auto-load switches of a plugin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootFlags {
    pub download_shared: bool,
    pub download_client: bool,
    pub load_classes: bool,
    pub load_libraries: bool,
    pub load_weapons: bool,
    pub load_entities: bool,
    pub load_effects: bool,
}

impl BootFlags {
    /// Whether the category loader of `stage` should run.
    /// Always `false` for the entrypoint stages.
    pub fn loads(&self, stage: BootStage) -> bool {
        match stage {
            BootStage::Classes => self.load_classes,
            BootStage::Libraries => self.load_libraries,
            BootStage::Weapons => self.load_weapons,
            BootStage::Entities => self.load_entities,
            BootStage::Effects => self.load_effects,
            BootStage::Shared | BootStage::Server | BootStage::Client => false,
        }
    }

    /// Whether any file of the plugin is offered to remote peers
    pub fn distributes(&self) -> bool {
        self.download_shared || self.download_client
    }
}

/// Validated, immutable plugin metadata
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDescriptor {
    pub group_id: String,
    pub plugin_id: String,
    /// `group_id/plugin_id`, unique within a registry
    pub identifier: String,
    /// Name of the discovery directory
    pub folder: String,
    /// Path of the plugin directory; entrypoints are relative to it
    pub root: PathBuf,
    pub version: Version,
    pub display_name: String,
    pub description: String,
    pub authors: Vec<String>,
    pub server: String,
    pub shared: String,
    pub client: String,
    pub flags: BootFlags,
    /// Raw stage tags, interpreted when the plugin boots
    pub load_order: Vec<String>,
    pub dependencies: Vec<DependencyConstraint>,
    pub soft_dependencies: Vec<DependencyConstraint>,
    pub private: bool,
    pub homepage: Option<String>,
    pub license: Option<String>,
    pub bug_tracker: Option<String>,
    pub funding: Option<String>,
    pub repository: Option<String>,
}

impl PluginDescriptor {
    /// Validate raw metadata read from `<root>/<folder>.<ext>`.
    ///
    /// `GroupID`, `PluginID`, `Version` and `Name` are required non-empty
    /// strings; the two ids may not contain `/` or whitespace. Other fields fall back to `defaults`; boolean flags are only
    /// set by a literal `true`.
    pub fn from_raw(
        folder: &str,
        root: &Path,
        raw: &Value,
        defaults: &DescriptorDefaults,
    ) -> Result<Self, PluginSystemError> {
        let invalid = |message: String| PluginSystemError::Validation {
            plugin: folder.to_string(),
            message,
        };

        let fields = raw
            .as_object()
            .ok_or_else(|| invalid(format!("metadata must be an object, found {}", type_name(raw))))?;

        let group_id = identifier_part(fields, "GroupID").map_err(invalid)?;
        let plugin_id = identifier_part(fields, "PluginID").map_err(invalid)?;
        let version_str = required_string(fields, "Version").map_err(invalid)?;
        let display_name = required_string(fields, "Name").map_err(invalid)?;

        let version = Version::parse(&version_str).map_err(|e| invalid(format!("field 'Version': {}", e)))?;

        let dependencies = constraints(fields, "Dependencies", false).map_err(invalid)?;
        let soft_dependencies = constraints(fields, "SoftDependencies", true).map_err(invalid)?;

        let flags = BootFlags {
            download_shared: flag(fields, "AutoDownloadShared"),
            download_client: flag(fields, "AutoDownloadClient"),
            load_classes: flag(fields, "AutoLoadClasses"),
            load_libraries: flag(fields, "AutoLoadLibraries"),
            load_weapons: flag(fields, "AutoLoadWeapons"),
            load_entities: flag(fields, "AutoLoadEntities"),
            load_effects: flag(fields, "AutoLoadEffects"),
        };

        Ok(Self {
            identifier: format!("{}/{}", group_id, plugin_id),
            group_id,
            plugin_id,
            folder: folder.to_string(),
            root: root.to_path_buf(),
            version,
            display_name,
            description: optional_string(fields, "Description").unwrap_or_else(|| defaults.description.clone()),
            authors: authors(fields).unwrap_or_else(|| defaults.authors.clone()),
            server: optional_string(fields, "Server").unwrap_or_else(|| defaults.server.clone()),
            shared: optional_string(fields, "Shared").unwrap_or_else(|| defaults.shared.clone()),
            client: optional_string(fields, "Client").unwrap_or_else(|| defaults.client.clone()),
            flags,
            load_order: string_list(fields, "LoadOrder").unwrap_or_else(|| defaults.load_order.clone()),
            dependencies,
            soft_dependencies,
            private: flag(fields, "Private"),
            homepage: optional_string(fields, "Homepage"),
            license: optional_string(fields, "License"),
            bug_tracker: optional_string(fields, "BugTracker"),
            funding: optional_string(fields, "Funding"),
            repository: optional_string(fields, "Repository"),
        })
    }

    /// Hard and soft constraints, hard first
    pub fn all_dependencies(&self) -> impl Iterator<Item = &DependencyConstraint> {
        self.dependencies.iter().chain(self.soft_dependencies.iter())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn required_string(fields: &Map<String, Value>, key: &str) -> Result<String, String> {
    match fields.get(key) {
        None | Some(Value::Null) => Err(format!("missing required field '{}'", key)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(format!("required field '{}' is empty", key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("field '{}' must be a string, found {}", key, type_name(other))),
    }
}

// Dependency declarations address plugins as `group/plugin`, split on whitespace.
fn identifier_part(fields: &Map<String, Value>, key: &str) -> Result<String, String> {
    let value = required_string(fields, key)?;
    if value.contains('/') || value.chars().any(char::is_whitespace) {
        return Err(format!("field '{}' may not contain '/' or whitespace, found '{}'", key, value));
    }
    Ok(value)
}

fn optional_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => {
            log::warn!(target: "kiln::manifest", "Ignoring field '{}': expected a string, found {}", key, type_name(other));
            None
        }
    }
}

fn string_list(fields: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    match fields.get(key)? {
        Value::Array(items) => {
            let list: Option<Vec<String>> = items.iter().map(|item| item.as_str().map(str::to_string)).collect();
            if list.is_none() {
                log::warn!(target: "kiln::manifest", "Ignoring field '{}': every entry must be a string", key);
            }
            list
        }
        Value::Null => None,
        other => {
            log::warn!(target: "kiln::manifest", "Ignoring field '{}': expected an array, found {}", key, type_name(other));
            None
        }
    }
}

// A single author may be given as a plain string.
fn authors(fields: &Map<String, Value>) -> Option<Vec<String>> {
    match fields.get("Authors")? {
        Value::String(author) => Some(vec![author.clone()]),
        _ => string_list(fields, "Authors"),
    }
}

fn flag(fields: &Map<String, Value>, key: &str) -> bool {
    matches!(fields.get(key), Some(Value::Bool(true)))
}

fn constraints(fields: &Map<String, Value>, key: &str, soft: bool) -> Result<Vec<DependencyConstraint>, String> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| DependencyConstraint::from_raw(item, soft).map_err(|e| format!("field '{}': {}", key, e)))
            .collect(),
        Some(other) => Err(format!("field '{}' must be an array, found {}", key, type_name(other))),
    }
}

/// Builder for descriptors assembled in code rather than read from disk
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    descriptor: PluginDescriptor,
}

impl ManifestBuilder {
    /// Start from `group/plugin` at `version`, with the default template applied.
    /// The folder is the plugin id.
    pub fn new(group_id: &str, plugin_id: &str, version: Version) -> Self {
        let defaults = DescriptorDefaults::default();
        Self {
            descriptor: PluginDescriptor {
                group_id: group_id.to_string(),
                plugin_id: plugin_id.to_string(),
                identifier: format!("{}/{}", group_id, plugin_id),
                folder: plugin_id.to_string(),
                root: PathBuf::from(plugin_id),
                version,
                display_name: plugin_id.to_string(),
                description: defaults.description,
                authors: defaults.authors,
                server: defaults.server,
                shared: defaults.shared,
                client: defaults.client,
                flags: BootFlags::default(),
                load_order: defaults.load_order,
                dependencies: Vec::new(),
                soft_dependencies: Vec::new(),
                private: false,
                homepage: None,
                license: None,
                bug_tracker: None,
                funding: None,
                repository: None,
            },
        }
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.descriptor.display_name = name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.descriptor.description = description.to_string();
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.descriptor.authors.push(author.to_string());
        self
    }

    /// Set the plugin directory
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.descriptor.root = root.into();
        self
    }

    pub fn folder(mut self, folder: &str) -> Self {
        self.descriptor.folder = folder.to_string();
        self
    }

    pub fn server(mut self, entrypoint: &str) -> Self {
        self.descriptor.server = entrypoint.to_string();
        self
    }

    pub fn shared(mut self, entrypoint: &str) -> Self {
        self.descriptor.shared = entrypoint.to_string();
        self
    }

    pub fn client(mut self, entrypoint: &str) -> Self {
        self.descriptor.client = entrypoint.to_string();
        self
    }

    pub fn flags(mut self, flags: BootFlags) -> Self {
        self.descriptor.flags = flags;
        self
    }

    /// Replace the load order with the given tags
    pub fn load_order(mut self, tags: &[&str]) -> Self {
        self.descriptor.load_order = tags.iter().map(|tag| tag.to_string()).collect();
        self
    }

    /// Add a hard or soft dependency, depending on `constraint.soft`
    pub fn dependency(mut self, constraint: DependencyConstraint) -> Self {
        if constraint.soft {
            self.descriptor.soft_dependencies.push(constraint);
        } else {
            self.descriptor.dependencies.push(constraint);
        }
        self
    }

    pub fn private(mut self, private: bool) -> Self {
        self.descriptor.private = private;
        self
    }

    pub fn license(mut self, license: &str) -> Self {
        self.descriptor.license = Some(license.to_string());
        self
    }

    pub fn repository(mut self, repository: &str) -> Self {
        self.descriptor.repository = Some(repository.to_string());
        self
    }

    /// Build the descriptor
    pub fn build(self) -> PluginDescriptor {
        self.descriptor
    }
}

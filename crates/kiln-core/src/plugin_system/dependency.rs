use std::fmt;
use serde_json::Value;
use thiserror::Error;

use crate::plugin_system::version::{Version, VersionMatcher};

/// Represents a dependency on another plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyConstraint {
    /// Composite `GroupID/PluginID` of the required plugin
    pub target: String,

    /// Operator applied between `required_version` and the candidate's version
    pub matcher: VersionMatcher,

    /// Version the operator compares against
    pub required_version: Version,

    /// Soft dependencies are loaded opportunistically; hard ones must resolve
    pub soft: bool,
}

/// Error that can occur when resolving dependencies
#[derive(Debug, Error)]
pub enum DependencyError {
    /// The required plugin was not found
    #[error("Plugin '{dependent}' requires '{target}', which is not available")]
    MissingPlugin { dependent: String, target: String },

    /// The plugin was found, but the version is incompatible
    #[error("Plugin version mismatch: '{dependent}' requires '{target} {constraint}' but found '{found}'")]
    IncompatibleVersion {
        dependent: String,
        target: String,
        constraint: String,
        found: Version,
    },

    /// Dependency cycle detected
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    /// The dependency was available but failed to load itself
    #[error("Plugin '{dependent}' cannot load because dependency '{target}' failed: {source}")]
    Unsatisfied {
        dependent: String,
        target: String,
        #[source]
        source: Box<crate::plugin_system::error::PluginSystemError>,
    },

    /// A dependency declaration could not be parsed
    #[error("Invalid dependency declaration '{declaration}': {reason}")]
    InvalidDeclaration { declaration: String, reason: String },
}

impl DependencyConstraint {
    /// Create a new hard dependency
    pub fn hard(target: &str, matcher: VersionMatcher, required_version: Version) -> Self {
        Self {
            target: target.to_string(),
            matcher,
            required_version,
            soft: false,
        }
    }

    /// Create a new soft dependency
    pub fn soft(target: &str, matcher: VersionMatcher, required_version: Version) -> Self {
        Self {
            target: target.to_string(),
            matcher,
            required_version,
            soft: true,
        }
    }

    /// Hard dependency accepting any version
    pub fn hard_any(target: &str) -> Self {
        Self::hard(target, VersionMatcher::Any, Version::new(0, 0, 0))
    }

    /// Soft dependency accepting any version
    pub fn soft_any(target: &str) -> Self {
        Self::soft(target, VersionMatcher::Any, Version::new(0, 0, 0))
    }

    /// Check whether a candidate version satisfies this constraint
    pub fn is_satisfied_by(&self, candidate: &Version) -> bool {
        self.matcher.matches(&self.required_version, candidate)
    }

    /// The `<op><version>` part of the declaration, `*` for any version
    pub fn requirement(&self) -> String {
        match self.matcher {
            VersionMatcher::Any => "*".to_string(),
            matcher => format!("{}{}", matcher, self.required_version),
        }
    }

    /// Parses a declaration string.
    ///
    /// Accepted forms: `"group/plugin"` (any version),
    /// `"group/plugin >=1.0.0"` and `"group/plugin 1.0"` (bare version means `>=`).
    pub fn parse(declaration: &str, soft: bool) -> Result<Self, DependencyError> {
        let invalid = |reason: &str| DependencyError::InvalidDeclaration {
            declaration: declaration.to_string(),
            reason: reason.to_string(),
        };
        let tokens: Vec<&str> = declaration.split_whitespace().collect();
        let requirement = match tokens.as_slice() {
            [] => return Err(invalid("empty declaration")),
            [_] => None,
            [_, requirement] => Some(requirement.to_string()),
            // ">= 1.0": a lone operator followed by its version
            [_, operator, version] if is_operator(operator) => Some(format!("{}{}", operator, version)),
            _ => return Err(invalid("expected 'group/plugin [<op>]<version>'")),
        };
        Self::from_parts(declaration, tokens[0], requirement.as_deref(), soft)
    }

    /// Parses a raw metadata entry, either a declaration string or an
    /// object `{"id": "group/plugin", "version": ">=1.0"}`.
    pub fn from_raw(raw: &Value, soft: bool) -> Result<Self, DependencyError> {
        match raw {
            Value::String(declaration) => Self::parse(declaration, soft),
            Value::Object(map) => {
                let declaration = raw.to_string();
                let target = map.get("id").and_then(Value::as_str).ok_or_else(|| {
                    DependencyError::InvalidDeclaration {
                        declaration: declaration.clone(),
                        reason: "missing string field 'id'".to_string(),
                    }
                })?;
                let requirement = match map.get("version") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(req)) => Some(req.as_str()),
                    Some(_) => {
                        return Err(DependencyError::InvalidDeclaration {
                            declaration,
                            reason: "field 'version' must be a string".to_string(),
                        });
                    }
                };
                Self::from_parts(&declaration, target, requirement, soft)
            }
            other => Err(DependencyError::InvalidDeclaration {
                declaration: other.to_string(),
                reason: "expected a string or an object".to_string(),
            }),
        }
    }

    fn from_parts(declaration: &str, target: &str, requirement: Option<&str>, soft: bool) -> Result<Self, DependencyError> {
        let invalid = |reason: String| DependencyError::InvalidDeclaration {
            declaration: declaration.to_string(),
            reason,
        };

        match target.split_once('/') {
            Some((group, plugin)) if !group.is_empty() && !plugin.is_empty() && !plugin.contains('/') => {}
            _ => return Err(invalid(format!("target '{}' is not of the form GroupID/PluginID", target))),
        }

        let (matcher, required_version) = match requirement {
            None => (VersionMatcher::Any, Version::new(0, 0, 0)),
            Some(req) => VersionMatcher::parse_requirement(req).map_err(|e| invalid(e.to_string()))?,
        };

        Ok(Self {
            target: target.to_string(),
            matcher,
            required_version,
            soft,
        })
    }
}

impl fmt::Display for DependencyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requirement_type = if self.soft { "Optional" } else { "Requires" };
        match self.matcher {
            VersionMatcher::Any => write!(f, "{} plugin: {} (any version)", requirement_type, self.target),
            _ => write!(f, "{} plugin: {} (version: {})", requirement_type, self.target, self.requirement()),
        }
    }
}

fn is_operator(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| matches!(b, b'=' | b'<' | b'>' | b'^' | b'~' | b'*'))
}

//! Declarative endpoint descriptors and the operation registry.
//!
//! Each API operation is one immutable [`EndpointDescriptor`] in a static
//! table. A [`Registry`] is built from that table once at startup; building
//! it validates every descriptor, so template-authoring defects surface as
//! errors at construction time rather than on some later call.

use crate::error::{FitError, Result};
use reqwest::Method;
use std::collections::BTreeMap;

/// Declarative description of one API operation.
///
/// Descriptors are plain static data: the shared resolver is the only thing
/// that interprets them.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    /// Operation id, e.g. `fitness.users.dataSources.get`.
    pub id: &'static str,
    /// URL path template relative to the base URL, with `{name}` placeholders.
    pub path: &'static str,
    /// HTTP method for the operation.
    pub method: Method,
    /// Parameter names that must be present in the caller's parameter bag.
    pub required_params: &'static [&'static str],
    /// Parameter names substituted into the path template (never sent as
    /// query or body). Always a subset of `required_params`.
    pub path_params: &'static [&'static str],
}

/// Immutable mapping from operation id to descriptor.
///
/// Built once at startup and shared by reference; safe to use from any number
/// of concurrent tasks.
#[derive(Debug, Clone)]
pub struct Registry {
    ops: BTreeMap<&'static str, &'static EndpointDescriptor>,
}

impl Registry {
    /// Build a registry from a static descriptor table.
    ///
    /// # Errors
    ///
    /// Returns an error if any descriptor is invalid (template placeholders
    /// and declared path parameters out of sync, path parameter not listed as
    /// required, unbalanced braces) or if two descriptors share an id.
    pub fn new(descriptors: &'static [EndpointDescriptor]) -> Result<Self> {
        let mut ops = BTreeMap::new();
        for descriptor in descriptors {
            validate_descriptor(descriptor)?;
            if ops.insert(descriptor.id, descriptor).is_some() {
                return Err(FitError::Config(format!(
                    "Duplicate operation id '{}' in descriptor table",
                    descriptor.id
                )));
            }
        }
        Ok(Self { ops })
    }

    /// Look up a descriptor by operation id.
    #[must_use]
    pub fn get(&self, operation: &str) -> Option<&'static EndpointDescriptor> {
        self.ops.get(operation).copied()
    }

    /// Registered operation ids, in sorted order.
    pub fn operation_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ops.keys().copied()
    }

    /// Registered descriptors, in operation-id order.
    pub fn descriptors(&self) -> impl Iterator<Item = &'static EndpointDescriptor> + '_ {
        self.ops.values().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

fn validate_descriptor(descriptor: &EndpointDescriptor) -> Result<()> {
    let placeholders = template_placeholders(descriptor.id, descriptor.path)?;

    for param in descriptor.path_params {
        if !placeholders.contains(param) {
            return Err(FitError::MalformedTemplate {
                operation: descriptor.id.to_string(),
                detail: format!("no placeholder for path parameter '{param}'"),
            });
        }
        if !descriptor.required_params.contains(param) {
            return Err(FitError::Config(format!(
                "Path parameter '{param}' in operation '{}' is not listed as required",
                descriptor.id
            )));
        }
    }

    for placeholder in &placeholders {
        if !descriptor.path_params.contains(placeholder) {
            return Err(FitError::MalformedTemplate {
                operation: descriptor.id.to_string(),
                detail: format!("placeholder '{{{placeholder}}}' is not a declared path parameter"),
            });
        }
    }

    Ok(())
}

/// Extract `{name}` placeholders from a path template.
fn template_placeholders<'a>(operation: &str, path: &'a str) -> Result<Vec<&'a str>> {
    let mut out = Vec::new();
    let mut rest = path;

    while let Some(start) = rest.find('{') {
        if rest[..start].contains('}') {
            return Err(FitError::MalformedTemplate {
                operation: operation.to_string(),
                detail: format!("stray '}}' in template '{path}'"),
            });
        }
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(FitError::MalformedTemplate {
                operation: operation.to_string(),
                detail: format!("unclosed '{{' in template '{path}'"),
            });
        };
        let name = &after[..end];
        if name.is_empty() || name.contains('{') {
            return Err(FitError::MalformedTemplate {
                operation: operation.to_string(),
                detail: format!("invalid placeholder in template '{path}'"),
            });
        }
        out.push(name);
        rest = &after[end + 1..];
    }

    if rest.contains('}') {
        return Err(FitError::MalformedTemplate {
            operation: operation.to_string(),
            detail: format!("stray '}}' in template '{path}'"),
        });
    }

    Ok(out)
}

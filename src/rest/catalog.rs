//! Declarative endpoint catalogs.
//!
//! A [`ResourceCatalog`] maps resource names to a base path and a set of
//! named methods, each with a path template and an HTTP verb. Per-service
//! SDKs ship catalogs as data; the client resolves them into requests.
//!
//! # Path Templates
//!
//! Templates use `{name}` placeholders:
//! - `users/{username}` - Single parameter
//! - `repos/{owner}/{repo}/issues` - Multiple parameters
//!
//! A method path is appended to its resource's base path.
//!
//! # Example
//!
//! ```rust
//! use fluent_rest::{HttpMethod, ResourceCatalog};
//! use std::collections::HashMap;
//!
//! let catalog = ResourceCatalog::from_json(r#"{
//!     "repos": {
//!         "basePath": "repos",
//!         "methods": {
//!             "get": { "path": "{owner}/{repo}" },
//!             "createIssue": { "path": "{owner}/{repo}/issues", "method": "POST" }
//!         }
//!     }
//! }"#).unwrap();
//!
//! let mut args = HashMap::new();
//! args.insert("owner".to_string(), "octocat".to_string());
//! args.insert("repo".to_string(), "hello-world".to_string());
//!
//! let (method, path) = catalog.resolve("repos", "createIssue", &args).unwrap();
//! assert_eq!(method, HttpMethod::Post);
//! assert_eq!(path, "repos/octocat/hello-world/issues");
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::clients::{HttpMethod, InvalidHttpRequestError};

/// One named endpoint of a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDefinition {
    /// Path template relative to the resource base path. May be empty.
    #[serde(default)]
    pub path: String,
    /// The HTTP verb; GET when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
}

impl MethodDefinition {
    /// Creates a GET endpoint at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: None,
        }
    }

    /// Sets the HTTP verb.
    #[must_use]
    pub const fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Returns the HTTP verb, defaulting to GET.
    #[must_use]
    pub fn http_method(&self) -> HttpMethod {
        self.method.unwrap_or(HttpMethod::Get)
    }
}

/// A resource: a base path plus its named endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    /// Path shared by every method of the resource.
    #[serde(alias = "base_path")]
    pub base_path: String,
    /// Endpoints by name.
    #[serde(default)]
    pub methods: BTreeMap<String, MethodDefinition>,
}

impl ResourceDefinition {
    /// Creates a resource with no methods.
    #[must_use]
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            methods: BTreeMap::new(),
        }
    }

    /// Adds a named endpoint.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, definition: MethodDefinition) -> Self {
        self.methods.insert(name.into(), definition);
        self
    }

    /// Returns the full path template for a method.
    #[must_use]
    pub fn template_for(&self, method: &MethodDefinition) -> String {
        let base = self.base_path.trim_matches('/');
        let path = method.path.trim_matches('/');
        match (base.is_empty(), path.is_empty()) {
            (true, _) => path.to_string(),
            (false, true) => base.to_string(),
            (false, false) => format!("{base}/{path}"),
        }
    }
}

/// A set of resources keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceCatalog {
    resources: BTreeMap<String, ResourceDefinition>,
}

impl ResourceCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the JSON does not describe a
    /// catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Adds or replaces a resource.
    #[must_use]
    pub fn resource(mut self, name: impl Into<String>, definition: ResourceDefinition) -> Self {
        self.resources.insert(name.into(), definition);
        self
    }

    /// Returns a resource by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResourceDefinition> {
        self.resources.get(name)
    }

    /// Returns the resource names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Returns `true` if the catalog has no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resolves a resource method into a verb and a concrete path.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::UnknownResource`] or
    /// [`InvalidHttpRequestError::UnknownMethod`] for names not in the
    /// catalog, and [`InvalidHttpRequestError::MissingPathParameter`] when a
    /// placeholder has no argument.
    #[allow(clippy::implicit_hasher)]
    pub fn resolve(
        &self,
        resource: &str,
        method: &str,
        args: &HashMap<String, String>,
    ) -> Result<(HttpMethod, String), InvalidHttpRequestError> {
        let definition =
            self.get(resource)
                .ok_or_else(|| InvalidHttpRequestError::UnknownResource {
                    name: resource.to_string(),
                })?;
        let endpoint =
            definition
                .methods
                .get(method)
                .ok_or_else(|| InvalidHttpRequestError::UnknownMethod {
                    resource: resource.to_string(),
                    method: method.to_string(),
                })?;

        let template = definition.template_for(endpoint);
        let path = build_path(&template, args)?;
        Ok((endpoint.http_method(), path))
    }
}

/// Builds a path from a template by interpolating arguments.
///
/// Replaces every `{name}` placeholder with the percent-encoded value of
/// `name`. Arguments without a placeholder are ignored.
///
/// # Errors
///
/// Returns [`InvalidHttpRequestError::MissingPathParameter`] for the first
/// placeholder without an argument.
///
/// # Example
///
/// ```rust
/// use fluent_rest::rest::build_path;
/// use std::collections::HashMap;
///
/// let mut args = HashMap::new();
/// args.insert("owner".to_string(), "octocat".to_string());
/// args.insert("repo".to_string(), "hello world".to_string());
///
/// let path = build_path("repos/{owner}/{repo}", &args).unwrap();
/// assert_eq!(path, "repos/octocat/hello%20world");
/// ```
#[allow(clippy::implicit_hasher)]
pub fn build_path(
    template: &str,
    args: &HashMap<String, String>,
) -> Result<String, InvalidHttpRequestError> {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        let value = args
            .get(name)
            .ok_or_else(|| InvalidHttpRequestError::MissingPathParameter {
                name: name.to_string(),
                template: template.to_string(),
            })?;
        result.push_str(&rest[..start]);
        result.push_str(&urlencoding::encode(value));
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

// Verify types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceCatalog>();
    assert_send_sync::<ResourceDefinition>();
};

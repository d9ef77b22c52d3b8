//! Chainable REST access.
//!
//! This module turns resource paths into requests:
//!
//! - **[`RestClient`]**: The entry point; owns the executor and exposes the
//!   cache and rate limit management API
//! - **[`PathBuilder`]**: Immutable, chainable path segments with terminal verbs
//! - **[`PageOptions`]**: Settings for `paginate` and `stream`
//! - **[`ResourceCatalog`]**: Declarative endpoint definitions with `{placeholder}` paths
//!
//! # Example
//!
//! ```rust,ignore
//! use fluent_rest::{ClientConfig, PageOptions, RequestOptions, RestClient};
//!
//! let client = RestClient::new(&ClientConfig::builder().base_url("https://api.github.com").build()?)?;
//!
//! // Follows Link headers until the last page.
//! let repos: Vec<serde_json::Value> = client
//!     .path("orgs")
//!     .segment("rust-lang")
//!     .segment("repos")
//!     .paginate(RequestOptions::new(), PageOptions::new().per_page(100))
//!     .await?;
//! ```

mod builder;
mod catalog;
mod client;
mod pagination;

pub use builder::PathBuilder;
pub use catalog::{build_path, MethodDefinition, ResourceCatalog, ResourceDefinition};
pub use client::RestClient;
pub use pagination::{PageOptions, DEFAULT_ITEM_KEYS};

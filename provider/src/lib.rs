//! Google Workspace provider core
//!
//! Maps declarative resources onto Cloud Identity and Gmail REST calls:
//! - `googleworkspace_dynamic_group` resource and data source
//! - `googleworkspace_user_delegate` resource
//!
//! Every API call goes through [`ApiClient::call`], which retries transient
//! faults using the classifier from `gworkspace_retry`.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod client;
pub mod config;
pub mod data_sources;
pub mod diag;
pub mod error;
pub mod provider;
pub mod resource_data;
pub mod resources;
pub mod schema;

pub use client::ApiClient;
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::{ProviderError, Result};
pub use provider::Provider;
pub use resource_data::ResourceData;
pub use schema::{Attribute, Schema};

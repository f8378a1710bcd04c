//! Forgejo API client.
//!
//! Talks to Forgejo, Codeberg and Gitea instances. The same client is the
//! source forge (repository listing and push mirrors) and a destination.
//!
//! - [`error`] - error types and their mapping onto [`crate::platform::PlatformError`]
//! - [`types`] - wire types
//! - [`client`] - the HTTP client
//! - [`convert`] - conversions to forgesync types

mod client;
mod convert;
mod error;
mod types;

pub use client::ForgejoClient;
pub use error::ForgejoError;
pub use types::{ForgejoPushMirror, ForgejoRepo, ForgejoUser};

//! GitHub REST API client.
//!
//! GitHub is only ever a destination: repositories are created and edited
//! there, while push mirrors stay on the source forge.

mod client;
mod convert;
mod error;
mod pagination;
mod types;

pub use client::GitHubClient;
pub use error::GitHubError;
pub use pagination::{LinkPagination, parse_link_header};
pub use types::{GitHubRepo, GitHubUser};

//! Push mirror lifecycle on the source forge.
//!
//! - [`remirror`] - when existing mirrors are recreated
//! - [`config`] - base/override mirror configuration
//! - [`mirrorer`] - create/replace/leave-alone reconciliation

mod config;
mod error;
mod mirrorer;
mod remirror;

pub use config::{DEFAULT_INTERVAL, PushMirrorConfig, ResolvedPushMirrorConfig};
pub use error::MirrorError;
pub use mirrorer::{PushMirrorer, matching_mirrors};
pub use remirror::{Remirror, RemirrorAction, RemirrorSyntaxError, TimeRule, should_remirror};

//! Push mirror configuration and its base/override overlay.

use super::error::MirrorError;
use super::remirror::Remirror;

/// Default mirror interval, in Forgejo duration syntax.
pub const DEFAULT_INTERVAL: &str = "8h0m0s";

/// Push mirror configuration where every field may be unset.
///
/// Used both for the run-wide base configuration and for per-call
/// overrides; [`PushMirrorConfig::overlay`] combines the two.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushMirrorConfig {
    /// Sync interval, e.g. `8h0m0s`.
    pub interval: Option<String>,
    pub remirror: Option<Remirror>,
    /// Trigger a sync right after creating a mirror.
    pub immediate: Option<bool>,
    /// Push on every commit instead of only on the interval.
    pub sync_on_push: Option<bool>,
}

impl PushMirrorConfig {
    /// The defaults used when nothing else is configured.
    pub fn defaults() -> Self {
        Self {
            interval: Some(DEFAULT_INTERVAL.to_string()),
            remirror: Some(Remirror::Never),
            immediate: Some(true),
            sync_on_push: Some(false),
        }
    }

    /// Each field of `other` if set, else the field of `self`.
    #[must_use]
    pub fn overlay(&self, other: &PushMirrorConfig) -> PushMirrorConfig {
        PushMirrorConfig {
            interval: other.interval.clone().or_else(|| self.interval.clone()),
            remirror: other.remirror.or(self.remirror),
            immediate: other.immediate.or(self.immediate),
            sync_on_push: other.sync_on_push.or(self.sync_on_push),
        }
    }

    /// Whether every field is set.
    pub fn is_valid(&self) -> bool {
        self.interval.is_some()
            && self.remirror.is_some()
            && self.immediate.is_some()
            && self.sync_on_push.is_some()
    }

    /// Convert into a fully-resolved configuration, naming the first unset field.
    pub fn resolve(&self) -> Result<ResolvedPushMirrorConfig, MirrorError> {
        let missing = |field: &'static str| MirrorError::InvalidConfig { field };

        Ok(ResolvedPushMirrorConfig {
            interval: self.interval.clone().ok_or_else(|| missing("interval"))?,
            remirror: self.remirror.ok_or_else(|| missing("remirror"))?,
            immediate: self.immediate.ok_or_else(|| missing("immediate"))?,
            sync_on_push: self.sync_on_push.ok_or_else(|| missing("sync_on_push"))?,
        })
    }
}

/// Push mirror configuration with every field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPushMirrorConfig {
    pub interval: String,
    pub remirror: Remirror,
    pub immediate: bool,
    pub sync_on_push: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_prefers_override() {
        let base = PushMirrorConfig {
            interval: Some("8h".to_string()),
            remirror: Some(Remirror::Never),
            immediate: Some(true),
            sync_on_push: Some(false),
        };
        let over = PushMirrorConfig {
            remirror: Some(Remirror::Always),
            ..Default::default()
        };

        let merged = base.overlay(&over);
        assert_eq!(
            merged,
            PushMirrorConfig {
                interval: Some("8h".to_string()),
                remirror: Some(Remirror::Always),
                immediate: Some(true),
                sync_on_push: Some(false),
            }
        );
        assert!(merged.is_valid());
    }

    #[test]
    fn test_overlay_keeps_unset_fields_unset() {
        let base = PushMirrorConfig {
            interval: Some("1h0m0s".to_string()),
            remirror: Some(Remirror::Never),
            immediate: None,
            sync_on_push: Some(true),
        };
        let merged = base.overlay(&PushMirrorConfig::default());
        assert!(!merged.is_valid());

        match merged.resolve().unwrap_err() {
            MirrorError::InvalidConfig { field } => assert_eq!(field, "immediate"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_defaults_resolve() {
        let resolved = PushMirrorConfig::defaults().resolve().unwrap();
        assert_eq!(resolved.interval, DEFAULT_INTERVAL);
        assert_eq!(resolved.remirror, Remirror::Never);
        assert!(resolved.immediate);
        assert!(!resolved.sync_on_push);
    }

    #[test]
    fn test_empty_config_is_invalid() {
        assert!(!PushMirrorConfig::default().is_valid());
        assert!(PushMirrorConfig::default().resolve().is_err());
    }
}

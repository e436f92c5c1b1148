use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use super::{ConfidencePolicy, PolicyDocument, PolicyError};

/// Shared reference to the active policy snapshot.
///
/// Readers clone the inner `Arc` and keep it for the whole calculation, so a concurrent
/// [`PolicyHandle::replace`] is never observed half-way through.
#[derive(Debug, Clone)]
pub struct PolicyHandle {
    current: Arc<RwLock<Arc<ConfidencePolicy>>>,
}

impl PolicyHandle {
    pub fn new(policy: ConfidencePolicy) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(policy))),
        }
    }

    pub fn snapshot(&self) -> Arc<ConfidencePolicy> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new snapshot, returning the one it replaced.
    pub fn replace(&self, policy: ConfidencePolicy) -> Arc<ConfidencePolicy> {
        let next = Arc::new(policy);
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, next);
        info!(
            auto_approve = guard.thresholds().auto_approve,
            quick_review = guard.thresholds().quick_review,
            "confidence policy replaced"
        );
        previous
    }

    /// Validate `document` and activate it. The active policy is untouched on error.
    pub fn load(&self, document: PolicyDocument) -> Result<Arc<ConfidencePolicy>, PolicyError> {
        let policy = ConfidencePolicy::from_document(document)?;
        Ok(self.replace(policy))
    }
}

impl Default for PolicyHandle {
    fn default() -> Self {
        Self::new(ConfidencePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RoutingThresholds;

    #[test]
    fn snapshots_taken_before_replace_keep_old_values() {
        let handle = PolicyHandle::default();
        let before = handle.snapshot();

        let document = PolicyDocument {
            thresholds: RoutingThresholds {
                auto_approve: 97.0,
                quick_review: 80.0,
            },
            ..PolicyDocument::default()
        };
        let previous = handle.load(document).expect("valid document");

        assert_eq!(before.thresholds().auto_approve, 90.0);
        assert_eq!(previous.thresholds().auto_approve, 90.0);
        assert_eq!(handle.snapshot().thresholds().auto_approve, 97.0);
    }

    #[test]
    fn invalid_document_leaves_active_policy_in_place() {
        let handle = PolicyHandle::default();
        let document = PolicyDocument {
            thresholds: RoutingThresholds {
                auto_approve: 60.0,
                quick_review: 70.0,
            },
            ..PolicyDocument::default()
        };

        assert!(matches!(
            handle.load(document),
            Err(PolicyError::ThresholdOrder { .. })
        ));
        assert_eq!(*handle.snapshot(), ConfidencePolicy::default());
    }

    #[test]
    fn clones_share_the_same_slot() {
        let handle = PolicyHandle::default();
        let other = handle.clone();
        let mut document = PolicyDocument::default();
        document.min_historical_sample = 25;
        other.load(document).expect("valid");

        assert_eq!(handle.snapshot().min_historical_sample(), 25);
    }
}

//! Share-access decision logic
//!
//! The single pure function every authorization path funnels through.
//! The SQL predicates in the API layer mirror exactly this logic; keeping
//! the decision here makes the access matrix testable without a database.

use crate::{EntityId, ShareType, Timestamp};
use serde::{Deserialize, Serialize};

/// The sharing state of a note as seen by the access evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareView {
    pub share_type: ShareType,
    pub expires_at: Option<Timestamp>,
    /// Users explicitly granted access. Only meaningful for private
    /// sessions; ignored for public ones.
    pub assigned_user_ids: Vec<EntityId>,
}

impl ShareView {
    fn is_expired(&self, now: Timestamp) -> bool {
        matches!(self.expires_at, Some(expires) if expires <= now)
    }
}

/// Outcome of an access evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Caller owns the note.
    Owner,
    /// Caller holds sharing-derived access.
    Granted,
    /// No access.
    Denied,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, AccessDecision::Denied)
    }
}

/// Evaluate whether `caller` may read the note owned by `owner_id`.
///
/// Rules, in order:
/// - the owner always has access, share or no share;
/// - an expired share session behaves as if it does not exist;
/// - a public session grants everyone, including anonymous callers;
/// - a private session grants exactly the assigned users.
///
/// `caller` is `None` for anonymous public-link reads; anonymous callers
/// can only ever satisfy the public branch.
pub fn evaluate_share_access(
    owner_id: EntityId,
    share: Option<&ShareView>,
    caller: Option<EntityId>,
    now: Timestamp,
) -> AccessDecision {
    if caller == Some(owner_id) {
        return AccessDecision::Owner;
    }

    let Some(share) = share else {
        return AccessDecision::Denied;
    };

    if share.is_expired(now) {
        return AccessDecision::Denied;
    }

    match share.share_type {
        ShareType::Public => AccessDecision::Granted,
        ShareType::Private => match caller {
            Some(user_id) if share.assigned_user_ids.contains(&user_id) => {
                AccessDecision::Granted
            }
            _ => AccessDecision::Denied,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_entity_id;
    use chrono::{Duration, Utc};

    fn share(share_type: ShareType, assigned: Vec<EntityId>) -> ShareView {
        ShareView {
            share_type,
            expires_at: None,
            assigned_user_ids: assigned,
        }
    }

    #[test]
    fn test_owner_always_has_access() {
        let owner = new_entity_id();
        let now = Utc::now();

        assert_eq!(
            evaluate_share_access(owner, None, Some(owner), now),
            AccessDecision::Owner
        );

        // Even with an expired share attached.
        let expired = ShareView {
            share_type: ShareType::Public,
            expires_at: Some(now - Duration::hours(1)),
            assigned_user_ids: vec![],
        };
        assert_eq!(
            evaluate_share_access(owner, Some(&expired), Some(owner), now),
            AccessDecision::Owner
        );
    }

    #[test]
    fn test_no_share_denies_non_owner() {
        let owner = new_entity_id();
        let stranger = new_entity_id();
        let now = Utc::now();

        assert_eq!(
            evaluate_share_access(owner, None, Some(stranger), now),
            AccessDecision::Denied
        );
        assert_eq!(
            evaluate_share_access(owner, None, None, now),
            AccessDecision::Denied
        );
    }

    #[test]
    fn test_public_share_grants_everyone() {
        let owner = new_entity_id();
        let stranger = new_entity_id();
        let now = Utc::now();
        let public = share(ShareType::Public, vec![]);

        assert_eq!(
            evaluate_share_access(owner, Some(&public), Some(stranger), now),
            AccessDecision::Granted
        );
        // Anonymous caller satisfies the public branch.
        assert_eq!(
            evaluate_share_access(owner, Some(&public), None, now),
            AccessDecision::Granted
        );
    }

    #[test]
    fn test_private_share_grants_only_assigned() {
        let owner = new_entity_id();
        let granted = new_entity_id();
        let stranger = new_entity_id();
        let now = Utc::now();
        let private = share(ShareType::Private, vec![granted]);

        assert_eq!(
            evaluate_share_access(owner, Some(&private), Some(granted), now),
            AccessDecision::Granted
        );
        assert_eq!(
            evaluate_share_access(owner, Some(&private), Some(stranger), now),
            AccessDecision::Denied
        );
        // Anonymous caller never satisfies the private branch.
        assert_eq!(
            evaluate_share_access(owner, Some(&private), None, now),
            AccessDecision::Denied
        );
    }

    #[test]
    fn test_expired_share_behaves_as_absent() {
        let owner = new_entity_id();
        let granted = new_entity_id();
        let now = Utc::now();

        let mut expired = share(ShareType::Public, vec![]);
        expired.expires_at = Some(now - Duration::seconds(1));
        assert_eq!(
            evaluate_share_access(owner, Some(&expired), Some(granted), now),
            AccessDecision::Denied
        );

        let mut expired_private = share(ShareType::Private, vec![granted]);
        expired_private.expires_at = Some(now - Duration::seconds(1));
        assert_eq!(
            evaluate_share_access(owner, Some(&expired_private), Some(granted), now),
            AccessDecision::Denied
        );
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let owner = new_entity_id();
        let caller = new_entity_id();
        let now = Utc::now();

        // expires_at strictly in the future: still valid.
        let mut view = share(ShareType::Public, vec![]);
        view.expires_at = Some(now + Duration::seconds(1));
        assert_eq!(
            evaluate_share_access(owner, Some(&view), Some(caller), now),
            AccessDecision::Granted
        );

        // expires_at == now: expired.
        view.expires_at = Some(now);
        assert_eq!(
            evaluate_share_access(owner, Some(&view), Some(caller), now),
            AccessDecision::Denied
        );
    }

    #[test]
    fn test_assignments_irrelevant_for_public() {
        let owner = new_entity_id();
        let stranger = new_entity_id();
        let leftover = new_entity_id();
        let now = Utc::now();

        // Orphaned assignments on a public session must not restrict access.
        let public = share(ShareType::Public, vec![leftover]);
        assert_eq!(
            evaluate_share_access(owner, Some(&public), Some(stranger), now),
            AccessDecision::Granted
        );
    }
}

//! Visibility resolution: which authors a viewer is allowed to see
//!
//! The policy, applied everywhere a post can surface:
//! - anonymous viewers see public accounts only
//! - authenticated viewers see themselves, accounts they follow and public
//!   accounts
//! - a block in either direction always wins
//!
//! Store failures propagate; visibility never silently degrades to an empty
//! set, because an empty set here would render a plausible-looking empty feed.
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::models::AccountPrivacy;
use crate::stores::UserStore;

pub struct VisibilityResolver {
    users: Arc<dyn UserStore>,
}

impl VisibilityResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Full set of author ids whose posts the viewer may see.
    pub async fn viewable_author_ids(&self, viewer_id: Option<Uuid>) -> Result<HashSet<Uuid>> {
        let Some(viewer) = viewer_id else {
            let public = self.users.public_author_ids().await?;
            debug!("Anonymous viewable set: {} public authors", public.len());
            return Ok(public.into_iter().collect());
        };

        let (following, public, blocked) = tokio::join!(
            self.users.following_ids(viewer),
            self.users.public_author_ids(),
            self.users.blocked_user_ids(viewer),
        );
        let following = following?;
        let public = public?;
        let blocked: HashSet<Uuid> = blocked?.into_iter().collect();

        let viewable = compose_viewable(viewer, &following, &public, &blocked);
        debug!(
            "Viewable set for {}: {} authors ({} following, {} blocked)",
            viewer,
            viewable.len(),
            following.len(),
            blocked.len()
        );
        Ok(viewable.into_iter().collect())
    }

    /// Point check with the same policy as `viewable_author_ids`.
    pub async fn can_view(&self, viewer_id: Option<Uuid>, target_id: Uuid) -> Result<bool> {
        if viewer_id == Some(target_id) {
            return Ok(true);
        }

        // Missing or deleted accounts are never viewable
        let Some(privacy) = self.users.account_privacy(target_id).await? else {
            return Ok(false);
        };

        match viewer_id {
            None => Ok(privacy == AccountPrivacy::Public),
            Some(viewer) => {
                if self.users.is_blocked_either_way(viewer, target_id).await? {
                    return Ok(false);
                }
                if privacy == AccountPrivacy::Public {
                    return Ok(true);
                }
                self.users.is_following(viewer, target_id).await
            }
        }
    }
}

/// Pure composition of a viewer's viewable set from already-loaded parts.
/// Sorted so cached payloads stay byte-stable across recomputes.
pub fn compose_viewable(
    viewer_id: Uuid,
    following: &[Uuid],
    public_ids: &[Uuid],
    blocked: &HashSet<Uuid>,
) -> Vec<Uuid> {
    let mut set: HashSet<Uuid> = HashSet::with_capacity(following.len() + public_ids.len() + 1);
    set.insert(viewer_id);
    set.extend(following.iter().copied());
    set.extend(public_ids.iter().copied());

    let mut viewable: Vec<Uuid> = set.into_iter().filter(|id| !blocked.contains(id)).collect();
    viewable.sort_unstable();
    viewable
}

//! Read-visibility rule for photos
//!
//! A photo is visible when it is public, or when the requester owns it. The
//! rule exists twice, once in Rust for the static file guard and once as a
//! SQL predicate for repository queries; both are defined here so they stay
//! in step.

use uuid::Uuid;

use crate::{identity::RequestIdentity, models::photo::Photo};

/// Whether `requester` may read a photo owned by `owner_id`
pub fn can_view(requester: &RequestIdentity, owner_id: Uuid, is_private: bool) -> bool {
    !is_private || requester.user_id() == Some(owner_id)
}

/// SQL form of [`can_view`] for a `photos` row aliased `p`
///
/// The placeholder `$param` must be bound to the requester's id, or NULL for
/// anonymous callers; `p.user_id = NULL` is never true, so anonymous callers
/// only match public rows.
pub fn visible_to_requester(param: usize) -> String {
    format!("(NOT p.is_private OR p.user_id = ${})", param)
}

impl Photo {
    pub fn is_visible_to(&self, requester: &RequestIdentity) -> bool {
        can_view(requester, self.user_id, self.is_private)
    }
}

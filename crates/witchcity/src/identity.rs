//! Caller identity and role lookup.
//!
//! Authentication happens upstream; the gateway forwards the authenticated user id in the
//! `X-User-Id` header. Roles are resolved through a [`MemberDirectory`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, ErrorKind};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Identifier of a community member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Member,
    VettingReviewer,
    CheckInStaff,
    Organizer,
    Administrator,
}

impl Role {
    pub const fn can_review_applications(self) -> bool {
        matches!(self, Role::VettingReviewer | Role::Administrator)
    }

    pub const fn can_check_in_attendees(self) -> bool {
        matches!(
            self,
            Role::CheckInStaff | Role::Organizer | Role::Administrator
        )
    }
}

/// Directory entry for a member, as seen by the workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: UserId,
    pub display_name: String,
    /// How the member's name is spoken aloud, when it differs from the display name.
    pub pronounced_name: Option<String>,
    pub pronouns: Option<String>,
    pub email: String,
    pub roles: Vec<Role>,
}

impl Member {
    pub fn has_role(&self, predicate: impl Fn(Role) -> bool) -> bool {
        self.roles.iter().copied().any(predicate)
    }
}

/// Read-only member lookup backed by the identity provider.
pub trait MemberDirectory: Send + Sync {
    fn member(&self, id: &UserId) -> Option<Member>;
}

/// Authenticated caller extracted from the forwarded identity header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::new(ErrorKind::Unauthorized, "Missing X-User-Id header"))?;

        Ok(ActingUser(UserId(raw.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn extracts_trimmed_user_id() {
        let request = Request::builder()
            .header(USER_ID_HEADER, " member-7 ")
            .body(())
            .expect("request builds");
        let (mut parts, _) = request.into_parts();

        let ActingUser(id) = ActingUser::from_request_parts(&mut parts, &())
            .await
            .expect("header present");
        assert_eq!(id, UserId("member-7".to_string()));
    }

    #[tokio::test]
    async fn rejects_missing_header_as_unauthorized() {
        let request = Request::builder().body(()).expect("request builds");
        let (mut parts, _) = request.into_parts();

        let rejection = ActingUser::from_request_parts(&mut parts, &())
            .await
            .expect_err("header missing");
        assert_eq!(rejection.kind, ErrorKind::Unauthorized);
    }

    #[test]
    fn reviewer_and_staff_roles_are_distinct() {
        assert!(Role::VettingReviewer.can_review_applications());
        assert!(!Role::CheckInStaff.can_review_applications());
        assert!(Role::CheckInStaff.can_check_in_attendees());
        assert!(!Role::Member.can_check_in_attendees());
        assert!(Role::Administrator.can_review_applications());
    }
}

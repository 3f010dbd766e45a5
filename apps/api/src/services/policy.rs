//! Authorization policy
//!
//! A pure decision table mapping (operation, identity, resource) to
//! allow/deny. Resolvers call [`require`] after the authentication gate has
//! set the request identity; the gate itself never rejects.

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Identity, Post};

/// Every operation the API exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    CreateUser,
    ListPosts,
    ReadPost,
    CreatePost,
    UpdatePost,
    DeletePost,
    UpdateStatus,
    ViewProfile,
    UploadImage,
}

/// What an operation demands of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    None,
    Authenticated,
    Owner,
}

impl Operation {
    pub fn requirement(self) -> Requirement {
        match self {
            Self::Login | Self::CreateUser | Self::ListPosts | Self::ReadPost => Requirement::None,
            Self::CreatePost | Self::UpdateStatus | Self::ViewProfile | Self::UploadImage => {
                Requirement::Authenticated
            }
            Self::UpdatePost | Self::DeletePost => Requirement::Owner,
        }
    }
}

/// Something with a single permanent owner
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Post {
    fn owner_id(&self) -> Uuid {
        self.creator_id
    }
}

/// Decide whether `identity` may perform `operation` on `resource`.
///
/// Owner-gated operations without a resource are denied.
pub fn allow(operation: Operation, identity: &Identity, resource: Option<&dyn Owned>) -> bool {
    check(operation, identity, resource).is_ok()
}

/// Like [`allow`], but fails with `NotAuthenticated` or `NotAuthorized`.
///
/// Returns the caller's user id when one is present.
pub fn require(
    operation: Operation,
    identity: &Identity,
    resource: Option<&dyn Owned>,
) -> ApiResult<Option<Uuid>> {
    check(operation, identity, resource)
}

/// Shorthand for operations that only need a signed-in caller
pub fn require_user(operation: Operation, identity: &Identity) -> ApiResult<Uuid> {
    require(operation, identity, None)?.ok_or(ApiError::NotAuthenticated)
}

fn check(
    operation: Operation,
    identity: &Identity,
    resource: Option<&dyn Owned>,
) -> ApiResult<Option<Uuid>> {
    let requirement = operation.requirement();
    if requirement == Requirement::None {
        return Ok(identity.user_id());
    }

    let user_id = identity.user_id().ok_or(ApiError::NotAuthenticated)?;

    if requirement == Requirement::Owner {
        match resource {
            Some(resource) if resource.owner_id() == user_id => {}
            _ => {
                tracing::debug!(user_id = %user_id, ?operation, "Ownership check failed");
                return Err(ApiError::NotAuthorized(
                    "only the owner may modify this post".to_string(),
                ));
            }
        }
    }

    Ok(Some(user_id))
}

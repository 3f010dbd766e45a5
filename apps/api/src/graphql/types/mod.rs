//! GraphQL type definitions for Quill
//!
//! Object types wrap the database models; input types convert into the
//! service-layer inputs.

mod post;
mod user;

pub use post::{Post, PostData, PostInputData};
pub use user::{AuthData, User, UserInputData};

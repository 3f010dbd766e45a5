//! Database models and types for Quill
//!
//! This module contains SQLx models for:
//! - Users and the per-request identity
//! - Posts and their image references

pub mod post;
pub mod user;

pub use post::{NewPost, Post, PostChanges, PostUpdate};
pub use user::{Identity, NewUser, User, DEFAULT_STATUS};

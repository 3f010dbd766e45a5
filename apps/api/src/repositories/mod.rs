//! Data store layer for Quill
//!
//! Each entity has an async repository trait so the services can run
//! against PostgreSQL in production and an in-memory store in tests.
//! All SQL lives in the `Pg*` implementations.

pub mod memory;
pub mod post;
pub mod user;
pub mod utils;

use std::sync::Arc;

pub use memory::MemoryStore;
pub use post::{PgPostRepository, PostRepository};
pub use user::{PgUserRepository, UserRepository};

/// Shared handle to a user store
pub type DynUserRepository = Arc<dyn UserRepository>;

/// Shared handle to a post store
pub type DynPostRepository = Arc<dyn PostRepository>;

//! Business logic services for Quill
//!
//! This module contains:
//! - Token issuing and verification
//! - The authorization policy table
//! - Accounts (registration, login, profile)
//! - Posts and the image assets attached to them
//! - Health checks

pub mod accounts;
pub mod assets;
pub mod health;
pub mod policy;
pub mod posts;
pub mod token;

pub use accounts::{AccountService, Registration, Session};
pub use assets::{AssetConfig, AssetCoordinator, CleanupOutcome};
pub use health::HealthService;
pub use posts::{PostInput, PostPage, PostService};
pub use token::{TokenConfig, TokenError, TokenService};

//! Domain layer
//!
//! Identifier types shared by the auth, storage, and API layers.

pub mod id;

pub use id::{RoleId, SessionId, UserId};

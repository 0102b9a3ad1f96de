//! Repository modules for data access
//!
//! Each repository exposes an async trait the services depend on plus the
//! SQLite implementation wired up at startup.

pub mod session;
pub mod user;

pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};

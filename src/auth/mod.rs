//! Authentication and authorization module entry point.
//!
//! Token signing and parsing, the per-device session store, the user-facing
//! auth flows, and the middleware that turns bearer tokens into request identity.

pub mod auth_service;
pub mod authorization;
pub mod hashing;
pub mod jwt;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod session;
pub mod validation;

pub use auth_service::AuthService;
pub use authorization::RoleRequirement;
pub use jwt::{Claims, TokenCodec};
pub use mailer::{ActivationMailer, LogMailer, MailDispatcher};
pub use middleware::AuthGate;
pub use models::{AuthError, AuthResponse, LocalSession, TokenKind, TokenPair, UserClaims};
pub use session::SessionService;

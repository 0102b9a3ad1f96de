pub mod admin;
pub mod auth;
pub mod health;
pub mod sessions;
pub mod users;

pub use admin::{list_user_sessions_handler, revoke_user_sessions_handler};
pub use auth::{
    activate_handler, login_handler, logout_handler, refresh_handler, registration_handler,
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
pub use health::health_handler;
pub use sessions::{
    list_sessions_handler, revoke_all_sessions_handler, revoke_other_sessions_handler,
    revoke_session_handler,
};
pub use users::current_user_handler;

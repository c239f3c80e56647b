//! # Auth Module
//!
//! Password and Google OAuth signup/login, token issuance and the request
//! authorization gate:
//! - `service` orchestrates the flows over the traits in `repository`, `jwt`
//!   and `session`
//! - `oauth` runs the redirect/callback exchange with the provider
//! - `extractors` holds the bearer-token gate and the `AuthedUser` extractor

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod models;
pub mod oauth;
pub mod password;
pub mod repository;
pub mod routes;
pub mod service;
pub mod session;
pub mod validators;


pub use error::{AuthError, AuthResult};
pub use jwt::{JwtService, TokenIssuer};
pub use repository::{SqliteUserRepository, UserRepository};
pub use routes::auth_routes;
pub use service::AuthService;
pub use session::{InMemorySessionStore, PendingSessionStore};

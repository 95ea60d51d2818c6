mod auth;

pub use auth::{AuthUser, Claims, JwtVerifier, auth_middleware};

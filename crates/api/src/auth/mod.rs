//! Super-admin authentication: password store, cookie JWTs and the
//! login-attempt limiter.

pub mod password;
pub mod rate_limit;
pub mod store;
pub mod token;

pub use password::PasswordChecker;
pub use rate_limit::LoginRateLimiter;
pub use store::{AdminStore, MemoryAdminStore, PgAdminStore};
pub use token::{ImpersonationClaims, SuperAdminClaims, TokenSigner};

//! Request middleware: identity verification and the authorization chain.

pub mod auth;
pub mod guard;

pub use auth::AuthPrincipal;
pub use guard::with_policy;

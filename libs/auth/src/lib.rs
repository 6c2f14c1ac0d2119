//! Credential and session-token helpers
//!
//! Password hashing and verification, signed session tokens, and the input
//! validators shared by the HTTP layer. Nothing here reads ambient state:
//! every secret arrives through an explicit [`JwtConfig`].

pub mod jwt;
pub mod password;
pub mod validation;

pub use jwt::{Claims, JwtConfig, JwtService};

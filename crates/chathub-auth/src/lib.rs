//! # chathub-auth
//!
//! Authentication for the ChatHub hub. Sessions and credentials are owned
//! by an external account service; this crate only verifies the HS256
//! bearer tokens that service mints, and can mint compatible tokens for
//! tooling and tests.
//!
//! ## Modules
//!
//! - `jwt`: token claims, verification and issuance

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};

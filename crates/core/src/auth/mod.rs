//! Admin credential handling.
//!
//! Only password hashing lives here; token issuance is in `anggara-shared`
//! so the API crate can share it with the binaries.

mod password;

pub use password::{PasswordError, hash_password, verify_password};

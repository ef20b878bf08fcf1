//! Credential digests for console users.
//!
//! The store never holds plaintext passwords; `users` documents carry a
//! SHA-256 digest and verification compares digests in constant time.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub fn digest_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(password: &str, stored_digest: &str) -> bool {
    let candidate = digest_password(password);
    candidate.as_bytes().ct_eq(stored_digest.as_bytes()).into()
}

//! Salted password hashing.
//!
//! Hashes are stored as `pbkdf2_sha256$<iterations>$<salt hex>$<hash hex>`.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::utils::math::generate_random_hex_string;

pub const PASSWORD_HASH_PREFIX: &str = "pbkdf2_sha256";
const OUTPUT_LEN: usize = 32;
const SALT_LEN: usize = 24;

fn derive(password: &str, salt: &str, iterations: u32) -> Vec<u8> {
    let mut out = vec![0u8; OUTPUT_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations.max(1), &mut out);
    out
}

pub fn is_hashed(value: &str) -> bool {
    value.starts_with(PASSWORD_HASH_PREFIX)
}

pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt = generate_random_hex_string(SALT_LEN);
    let hash = derive(password, &salt, iterations);
    format!(
        "{}${}${}${}",
        PASSWORD_HASH_PREFIX,
        iterations.max(1),
        salt,
        hex::encode(hash)
    )
}

/// Hash `value` unless it already is a stored hash.
pub fn ensure_hashed(value: &str, iterations: u32) -> String {
    if is_hashed(value) {
        value.to_owned()
    } else {
        hash_password(value, iterations)
    }
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(PASSWORD_HASH_PREFIX), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let Ok(expected) = hex::decode(expected) else {
        return false;
    };
    if expected.len() != OUTPUT_LEN {
        return false;
    }
    derive(password, salt, iterations).ct_eq(&expected).into()
}

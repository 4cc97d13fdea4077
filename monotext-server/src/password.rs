use sha2::{Digest, Sha256};
use thiserror::Error;

/// Scheme tag written at the front of every stored hash
const SCHEME: &str = "sha256";
const DEFAULT_ITERATIONS: u32 = 20_000;
const SALT_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("unsupported password hash scheme: {0}")]
    UnknownScheme(String),
    #[error("malformed password hash")]
    Malformed,
}

/// Hash a password as `sha256$<iterations>$<salt hex>$<digest hex>`
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    hash_with(password, &salt, DEFAULT_ITERATIONS)
}

/// Check a password against a stored hash
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let mut parts = stored.split('$');
    let scheme = parts.next().ok_or(PasswordError::Malformed)?;
    if scheme != SCHEME {
        return Err(PasswordError::UnknownScheme(scheme.to_string()));
    }

    let iterations: u32 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .ok_or(PasswordError::Malformed)?;
    let salt = parts
        .next()
        .and_then(|s| hex::decode(s).ok())
        .ok_or(PasswordError::Malformed)?;
    let expected = parts
        .next()
        .and_then(|s| hex::decode(s).ok())
        .ok_or(PasswordError::Malformed)?;
    if parts.next().is_some() {
        return Err(PasswordError::Malformed);
    }

    let actual = stretch(password, &salt, iterations);
    Ok(constant_time_eq(&actual, &expected))
}

fn hash_with(password: &str, salt: &[u8], iterations: u32) -> String {
    let digest = stretch(password, salt, iterations);
    format!(
        "{}${}${}${}",
        SCHEME,
        iterations,
        hex::encode(salt),
        hex::encode(digest)
    )
}

fn stretch(password: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut digest = hasher.finalize();

    for _ in 1..iterations {
        let mut hasher = Sha256::new();
        hasher.update(digest);
        hasher.update(salt);
        digest = hasher.finalize();
    }

    digest.to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

//! Cryptographic Utilities

use rand::{RngCore, rngs::OsRng};

/// Generate cryptographically secure random bytes
///
/// Fails only if the operating system RNG is unavailable.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, rand::Error> {
    let mut bytes = vec![0u8; len];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(bytes)
}

/// Generate a numeric one-time code of `len` decimal digits
///
/// Uses rejection sampling so every digit is uniform: bytes >= 250 are
/// discarded instead of being folded with `% 10`.
pub fn random_numeric_code(len: usize) -> Result<String, rand::Error> {
    let mut code = String::with_capacity(len);
    let mut buf = [0u8; 16];

    while code.len() < len {
        OsRng.try_fill_bytes(&mut buf)?;
        for &b in buf.iter().filter(|&&b| b < 250) {
            if code.len() == len {
                break;
            }
            code.push(char::from(b'0' + b % 10));
        }
    }

    Ok(code)
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

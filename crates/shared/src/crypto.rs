//! Cryptographic helpers for one-time codes.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of digits in an OTP code.
pub const OTP_DIGITS: usize = 6;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a uniformly random, zero-padded 6-digit code.
pub fn generate_otp_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

/// Hashes an OTP code together with the phone number it was issued to,
/// so equal codes for different numbers never share a hash.
pub fn hash_otp(mobile: &str, code: &str) -> String {
    sha256_hex(&format!("{}:{}", mobile, code))
}

/// Compares two hex digests without short-circuiting on the first mismatch.
pub fn digests_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

//! Shannon entropy over declared alphabets.
//!
//! # Invariants
//! - Only bytes inside the chosen alphabet contribute to the estimate;
//!   probabilities are still taken over the full input length, so foreign
//!   bytes lower the score instead of inflating it.
//! - Empty input has entropy 0.

/// Base64 alphabet including the `=` padding byte.
pub const BASE64_CHARS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

/// Hexadecimal alphabet, both cases.
pub const HEX_CHARS: &[u8] = b"1234567890abcdefABCDEF";

/// Shannon entropy (bits per symbol) of `data` restricted to `alphabet`.
pub fn shannon_entropy(data: &[u8], alphabet: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut counts = [0u32; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    let len = data.len() as f64;
    let mut entropy = 0.0;
    for &a in alphabet {
        let n = counts[a as usize];
        if n > 0 {
            let p = f64::from(n) / len;
            entropy -= p * p.log2();
        }
    }
    entropy
}

//! Shared utility functions for shop-server

pub use shared::util::now_millis;

/// Number of random bytes behind an auth-link code (hex-encoded to 64 chars)
const AUTH_CODE_BYTES: usize = 32;

/// Generate a one-time auth-link code from the OS-seeded CSPRNG
pub fn generate_auth_code() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; AUTH_CODE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// New random primary key
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Escape `%`, `_` and `\` so user input is matched literally inside `LIKE`
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

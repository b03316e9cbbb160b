//! Session token generation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

const TOKEN_BYTES: usize = 32;

/// Generates an unguessable session token.
///
/// 32 bytes from the thread-local CSPRNG, URL-safe base64 (43 characters).
#[must_use]
pub fn new_session_id() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

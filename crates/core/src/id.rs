//! Opaque record identifiers.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::model::RecordId;

/// Random bytes per identifier. 128 bits keeps collisions negligible without a retry loop.
const ID_BYTES: usize = 16;

/// Encoded length of an identifier (unpadded base64 of `ID_BYTES`).
pub const ID_LEN: usize = 22;

/// Generate a fresh URL-safe identifier from the OS CSPRNG.
///
/// Panics if the OS randomness source fails; there is no sensible way to continue.
pub fn generate_id() -> RecordId {
    let mut bytes = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Cheap shape check used by the request layer before touching a store.
pub fn is_well_formed(id: &str) -> bool {
    id.len() == ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

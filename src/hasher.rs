/// Fingerprint hashing of canonical scope strings.
use sha2::{Digest as _, Sha256};

use crate::types::Fingerprint;

/// Hash a canonical scope string into a fingerprint.
///
/// The digest is the lowercase hex SHA-256 of the string; the numeric hash
/// folds the first eight digest bytes, big endian.
pub fn fingerprint(canonical: &str) -> Fingerprint {
    let digest = Sha256::digest(canonical.as_bytes());
    let hash = digest.as_slice().first_chunk::<8>().map_or(0, |bytes| return u64::from_be_bytes(*bytes));

    return Fingerprint {
        digest: format!("{digest:x}"),
        hash,
    };
}

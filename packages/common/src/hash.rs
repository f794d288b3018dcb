use sha2::{Digest, Sha256};

/// Content hash of a source text (lowercase hex SHA-256).
///
/// Compilation outcomes are memoized under this key, so two files with the
/// same text share one compiled unit regardless of path or version.
pub fn content_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

use md5::{Digest, Md5};

/// Short content fingerprint used for optimistic locking.
///
/// The first four bytes of the MD5 digest as eight lowercase hex characters.
/// Clients compare these strings verbatim, so the format must stay stable.
pub fn content_hash(content: &str) -> String {
    let digest = Md5::digest(content.as_bytes());
    digest[..4].iter().map(|byte| format!("{byte:02x}")).collect()
}

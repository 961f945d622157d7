//! Deterministic key and document synthesis.
//!
//! Everything here is a pure function of its arguments: the same record id
//! always yields the same key, and the same key always yields the same
//! document, so any worker (or an offline verifier) can recompute what was
//! written without talking to the store.

use crate::adapter::Document;
use crate::error::ConfigError;
use md5::{Digest, Md5};
use serde_json::Value;

/// Length of a hex-encoded MD5 digest
pub const DIGEST_LEN: usize = 32;

/// Width of the key window copied into each indexable field
pub const FIELD_WINDOW: usize = 10;

/// Field `i` reads `key[i..i + FIELD_WINDOW]`, so the last usable offset is
/// `DIGEST_LEN - FIELD_WINDOW`.
pub const MAX_INDEXABLE_FIELDS: usize = DIGEST_LEN - FIELD_WINDOW;

/// Lowercase hex MD5 of `input`.
pub fn hash(input: &str) -> String {
    format!("{:x}", Md5::digest(input.as_bytes()))
}

/// Key for record `id`: hash of its decimal form.
pub fn hashed_key(id: u64) -> String {
    hash(&id.to_string())
}

/// Deterministic pseudo-random text of exactly `len` characters derived from
/// `key`.
///
/// Up to 64 characters come from the digests of the key and of the key minus
/// its last character. Longer strings repeat the string of half the length.
pub fn rand_string(key: &str, len: usize) -> String {
    if len > 2 * DIGEST_LEN {
        let half = rand_string(key, len / 2);
        // odd lengths take one more character from the start of `half`
        return half.chars().cycle().take(len).collect();
    }
    let prefix = match key.char_indices().last() {
        Some((idx, _)) => &key[..idx],
        None => key,
    };
    let mut seed = hash(key) + &hash(prefix);
    seed.truncate(len);
    seed
}

/// Name of indexable field `i`
pub fn field_name(i: usize) -> String {
    format!("field{i}")
}

/// Value stored in indexable field `i` of the document for `key`.
///
/// Query predicates are built with this too, which is what makes them
/// answerable.
pub fn field_value(key: &str, i: usize) -> String {
    format!("{}-{}", field_name(i), &key[i..i + FIELD_WINDOW])
}

/// Document with `indexable_fields` key-derived fields plus one body field
/// padded with the key's digest towards `size` bytes.
pub fn indexable_document(
    key: &str,
    indexable_fields: usize,
    size: usize,
) -> Result<Document, ConfigError> {
    if indexable_fields > MAX_INDEXABLE_FIELDS || key.len() < indexable_fields + FIELD_WINDOW {
        return Err(ConfigError::TooManyIndexableFields {
            requested: indexable_fields,
            max: MAX_INDEXABLE_FIELDS.min(key.len().saturating_sub(FIELD_WINDOW)),
        });
    }

    let mut doc = Document::new();
    for i in 0..indexable_fields {
        doc.insert(field_name(i), Value::String(field_value(key, i)));
    }

    let body_name = field_name(indexable_fields);
    let field_len = body_name.len() + 1 + FIELD_WINDOW;
    let iterations = size.saturating_sub(field_len * indexable_fields) / DIGEST_LEN;
    doc.insert(body_name, Value::String(hash(key).repeat(iterations)));
    Ok(doc)
}

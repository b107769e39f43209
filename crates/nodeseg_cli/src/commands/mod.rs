//! CLI command implementations.

pub mod changesets;
pub mod dump;
pub mod generate;
pub mod inspect;

/// Lowercase hex of `bytes`.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

//! Shared utilities.
//!
//! Fingerprint hashing and test helpers.

pub mod hash;

#[cfg(test)]
pub mod testutil;

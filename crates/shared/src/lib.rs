//! Shared utilities and common types for the Flashy backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Redemption code and coordinate validation
//! - Keyset cursors for the offer listing
//! - Identity token verification (JWT)
//! - Hashing helpers

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod validation;

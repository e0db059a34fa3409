//! Shared utilities and common types for the Sawa backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (OTP generation, hashing)
//! - Password hashing with Argon2id
//! - JWT issuance and validation
//! - Story image payload parsing
//! - Common validation logic and pagination

pub mod crypto;
pub mod image;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;

//! Shared utilities and common types for the Helpdesk backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (token generation, digests)
//! - Password hashing with Argon2id
//! - JWT access tokens
//! - Cursor-based pagination
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;

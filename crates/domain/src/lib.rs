//! Domain layer for the Helpdesk backend.
//!
//! This crate contains:
//! - Domain models (Ticket, Reply, User, Category)
//! - Business logic services (engagement classification, invitation rules,
//!   notification kinds)
//! - Domain error types

pub mod models;
pub mod services;

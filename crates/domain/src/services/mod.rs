//! Business logic services.

pub mod engagement;
pub mod invitation;
pub mod notification;

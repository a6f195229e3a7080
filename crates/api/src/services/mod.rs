//! Application services.

pub mod email;
pub mod notifier;
pub mod ticket_lifecycle;

pub use email::EmailService;
pub use notifier::Notifier;
pub use ticket_lifecycle::TicketLifecycleService;

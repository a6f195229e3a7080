//! Repository implementations.

pub mod category;
pub mod notification;
pub mod reply;
pub mod ticket;
pub mod user;

pub use category::CategoryRepository;
pub use notification::NotificationRepository;
pub use reply::ReplyRepository;
pub use ticket::TicketRepository;
pub use user::UserRepository;

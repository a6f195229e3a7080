//! Entity definitions (database row mappings).

pub mod category;
pub mod notification;
pub mod reply;
pub mod ticket;
pub mod user;

pub use category::CategoryEntity;
pub use notification::QueuedNotificationEntity;
pub use reply::ReplyEntity;
pub use ticket::{
    AutoCloseCandidateEntity, OpenTicketEngagementEntity, TicketEntity, TicketPriorityDb,
    TicketStatusDb, TicketWithLatestReplyEntity,
};
pub use user::UserEntity;

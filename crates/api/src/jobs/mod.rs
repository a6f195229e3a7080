//! Background job scheduler and job implementations.

mod auto_close;
mod notification_delivery;
mod pool_metrics;
mod scheduler;

pub use auto_close::AutoCloseJob;
pub use notification_delivery::NotificationDeliveryJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::JobScheduler;

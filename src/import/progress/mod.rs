mod handle;

pub use handle::{ImportNotifications, NotificationFilter};

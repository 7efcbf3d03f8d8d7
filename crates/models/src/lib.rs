mod alert;
mod group;
mod id;
mod notification;
mod schedule;

pub use alert::{Alert, AlertDraft, AlertType, ChannelPrefs, Severity};
pub use group::AlertGroup;
pub use id::{Id, IdGenerator};
pub use notification::{Channel, Notification, NotificationStatus};
pub use schedule::{Recurrence, ScheduleEntry, ScheduleStatus};

mod broadcast;

pub use broadcast::{BroadcastScheduler, SchedulerState, SubscriberRegistry, Subscription};

// Messaging module - lock-free channels between scheduler and observers

pub mod channels;
pub mod command;
pub mod notification;

pub use channels::{
    create_command_channel, create_notification_channel, CommandConsumer, CommandProducer,
    NotificationConsumer, NotificationProducer,
};
pub use command::EngineCommand;
pub use notification::EngineNotification;

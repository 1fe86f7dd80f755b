// Communication channels lock-free

use crate::messaging::command::EngineCommand;
use crate::messaging::notification::EngineNotification;
use ringbuf::{HeapRb, traits::Split};

pub type CommandProducer = ringbuf::HeapProd<EngineCommand>;
pub type CommandConsumer = ringbuf::HeapCons<EngineCommand>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<EngineCommand>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<EngineNotification>;
pub type NotificationConsumer = ringbuf::HeapCons<EngineNotification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<EngineNotification>::new(capacity);
    rb.split()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Consumer, Producer};

    #[test]
    fn test_command_channel_round_trip() {
        let (mut tx, mut rx) = create_command_channel(8);

        tx.try_push(EngineCommand::SetBpm(140.0)).unwrap();
        tx.try_push(EngineCommand::Start).unwrap();

        assert_eq!(rx.try_pop(), Some(EngineCommand::SetBpm(140.0)));
        assert_eq!(rx.try_pop(), Some(EngineCommand::Start));
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn test_notification_channel_capacity() {
        let (mut tx, _rx) = create_notification_channel(2);

        assert!(tx.try_push(EngineNotification::OffsetChanged(0)).is_ok());
        assert!(tx.try_push(EngineNotification::OffsetChanged(1)).is_ok());
        assert!(tx.try_push(EngineNotification::OffsetChanged(2)).is_err());
    }
}

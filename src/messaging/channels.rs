// Lock-free SPSC channels

use crate::messaging::command::Command;
use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

pub type CommandProducer = ringbuf::HeapProd<Command>;
pub type CommandConsumer = ringbuf::HeapCons<Command>;

/// Control thread -> audio thread
pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<Command>::new(capacity.max(1));
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

/// Audio thread -> control thread
pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity.max(1));
    rb.split()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Consumer, Observer, Producer};

    #[test]
    fn test_command_channel_fifo() {
        let (mut tx, mut rx) = create_command_channel(4);

        tx.try_push(Command::SetTempo(100.0)).unwrap();
        tx.try_push(Command::Pause).unwrap();

        assert!(matches!(rx.try_pop(), Some(Command::SetTempo(b)) if b == 100.0));
        assert!(matches!(rx.try_pop(), Some(Command::Pause)));
        assert!(rx.try_pop().is_none());
    }

    #[test]
    fn test_command_channel_full() {
        let (mut tx, _rx) = create_command_channel(2);

        assert!(tx.try_push(Command::Pause).is_ok());
        assert!(tx.try_push(Command::Unpause).is_ok());
        assert!(tx.is_full());
        assert!(tx.try_push(Command::Reset).is_err());
    }
}

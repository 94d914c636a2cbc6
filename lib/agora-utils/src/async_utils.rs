use tokio::sync::{mpsc, watch};

/// Forwards every change published on a watch channel into an unbounded
/// channel, mapped through `f`. Changes published faster than the pipe
/// reads them are coalesced, as with any watch receiver.
pub fn pipe_watch<I, O, F>(mut in_channel: watch::Receiver<I>, mut f: F) -> mpsc::UnboundedReceiver<O>
where
    I: 'static + Send + Sync,
    O: 'static + Send,
    F: 'static + FnMut(&I) -> Option<O> + Send
{
    let (sender, receiver) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sender.closed() => {
                    // receiver is dropped, drop sender
                    break;
                },

                change_res = in_channel.changed() => {
                    if change_res.is_err() {
                        // watch sender is dropped, drop sender
                        break
                    }
                    let message_out = {
                        let value = in_channel.borrow_and_update();
                        f(&value)
                    };
                    if let Some(message_out) = message_out {
                        if sender.send(message_out).is_err() {
                            // receiver is dropped, drop sender
                            break
                        }
                    }
                },
            }
        }
    });
    receiver
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_changes() {
        let (sender, receiver) = watch::channel(0u32);
        let mut piped = pipe_watch(receiver, |value| Some(value * 10));

        sender.send(1).unwrap();
        assert_eq!(piped.recv().await, Some(10));

        sender.send(2).unwrap();
        assert_eq!(piped.recv().await, Some(20));
    }

    #[tokio::test]
    async fn skips_filtered_values() {
        let (sender, receiver) = watch::channel(0u32);
        let mut piped = pipe_watch(receiver, |value| if value % 2 == 0 { Some(*value) } else { None });

        sender.send(1).unwrap();
        tokio::task::yield_now().await;
        sender.send(2).unwrap();
        assert_eq!(piped.recv().await, Some(2));
    }

    #[tokio::test]
    async fn closes_when_watch_sender_is_dropped() {
        let (sender, receiver) = watch::channel(0u32);
        let mut piped = pipe_watch(receiver, |value| Some(*value));
        drop(sender);
        assert_eq!(piped.recv().await, None);
    }
}

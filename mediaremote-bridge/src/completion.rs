use std::sync::Mutex;

use log::trace;
use tokio::sync::oneshot;

/// A completion that forwards its first invocation into a oneshot channel.
///
/// Later invocations are dropped. When the completion is dropped without being
/// called the receiver resolves to an error.
pub(crate) fn once_completion<T: Send + 'static>()
-> (impl Fn(T) + Send + 'static, oneshot::Receiver<T>) {
    let (tx, rx) = oneshot::channel();
    let tx = Mutex::new(Some(tx));

    let completion = move |value: T| {
        let sender = tx.lock().ok().and_then(|mut x| x.take());
        match sender {
            Some(sender) => {
                let _ = sender.send(value);
            }
            None => trace!("Ignoring repeated completion"),
        }
    };

    (completion, rx)
}

use crossbeam_channel::{Receiver, Select, SendTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared one-shot shutdown signal.
///
/// Backed by a channel that never carries a message: cancelling drops the
/// only sender, which disconnects every receiver at once. That makes the
/// signal usable inside `select!` next to ordinary channels.
#[derive(Clone)]
pub struct CancelFlag {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    done: Receiver<()>,
}

impl CancelFlag {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(tx))),
            done: rx,
        }
    }

    /// Idempotent.
    pub fn cancel(&self) {
        let mut guard = match self.trigger.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take();
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.done.try_recv(),
            Err(crossbeam_channel::TryRecvError::Disconnected)
        )
    }

    /// Becomes ready (with an error) once cancelled.
    pub fn done(&self) -> &Receiver<()> {
        &self.done
    }
}

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// A send that did not happen. Hands the value back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError<T> {
    Cancelled(T),
    Disconnected(T),
}

impl<T> SendError<T> {
    pub fn into_inner(self) -> T {
        match self {
            SendError::Cancelled(value) | SendError::Disconnected(value) => value,
        }
    }
}

/// Blocking send that gives up when `cancel` fires first.
pub fn send<T>(cancel: &CancelFlag, tx: &Sender<T>, value: T) -> Result<(), SendError<T>> {
    let mut sel = Select::new();
    let cancelled = sel.recv(cancel.done());
    sel.send(tx);

    let oper = sel.select();
    if oper.index() == cancelled {
        let _ = oper.recv(cancel.done());
        Err(SendError::Cancelled(value))
    } else {
        oper.send(tx, value).map_err(|err| SendError::Disconnected(err.into_inner()))
    }
}

/// Send with an upper bound on how long to wait for the receiver.
pub fn send_within<T>(tx: &Sender<T>, value: T, timeout: Duration) -> Result<(), SendError<T>> {
    tx.send_timeout(value, timeout).map_err(|err| match err {
        SendTimeoutError::Timeout(value) => SendError::Cancelled(value),
        SendTimeoutError::Disconnected(value) => SendError::Disconnected(value),
    })
}

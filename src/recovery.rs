use log::error;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crate::cancel::CancelFlag;

/// Runs worker threads whose panics are held back until the owner has had
/// a chance to clean up (restore the terminal, in practice).
///
/// A panicking worker cancels everything, parks until [`Recovery::release`]
/// is called, then resumes unwinding so the panic surfaces through `join`.
#[derive(Clone)]
pub struct Recovery {
    cancel: CancelFlag,
    release: CancelFlag,
}

impl Recovery {
    pub fn new(cancel: CancelFlag) -> Self {
        Self {
            cancel,
            release: CancelFlag::new(),
        }
    }

    pub fn spawn<F>(&self, name: &str, f: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let release = self.release.clone();
        let thread_name = name.to_string();

        thread::Builder::new().name(name.to_string()).spawn(move || {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
                error!("Thread {thread_name} panicked: {}", panic_message(&*payload));
                cancel.cancel();
                // blocks until released
                let _ = release.done().recv();
                panic::resume_unwind(payload);
            }
        })
    }

    /// Let parked panics continue. Idempotent.
    pub fn release(&self) {
        self.release.cancel();
    }
}

pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

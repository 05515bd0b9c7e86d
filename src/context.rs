//! Designated execution context for marshaled callbacks.
//!
//! A `CallbackContext` is a FIFO queue of callbacks. Producers hold a cheap
//! `ContextPoster`; the owner either pumps the queue from its own loop with
//! `run_pending()` (a "main thread") or hands it to a dedicated thread with
//! `spawn()`. Callbacks always run in posting order.
//!
//! A panicking callback is caught and logged so one bad listener can't take
//! the context down with it.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Owner side of the queue.
pub struct CallbackContext {
    tx: Sender<Callback>,
    rx: Receiver<Callback>,
}

/// Producer side of the queue; clone freely.
#[derive(Clone)]
pub struct ContextPoster {
    tx: Sender<Callback>,
}

impl std::fmt::Debug for ContextPoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextPoster")
            .field("queued", &self.tx.len())
            .finish()
    }
}

impl ContextPoster {
    /// Queue `f` for the context. Returns false (and drops `f`) when the
    /// context no longer exists.
    pub fn post(&self, f: impl FnOnce() + Send + 'static) -> bool {
        match self.tx.send(Box::new(f)) {
            Ok(()) => true,
            Err(_) => {
                debug!("callback context is gone; dropping posted callback");
                false
            }
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic payload".to_string()
}

fn run_guarded(cb: Callback) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(cb)) {
        warn!(panic = %panic_message(payload), "listener callback panicked");
    }
}

impl Default for CallbackContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackContext {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn poster(&self) -> ContextPoster {
        ContextPoster {
            tx: self.tx.clone(),
        }
    }

    /// Number of callbacks waiting to run.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Run every queued callback on the calling thread. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(cb) = self.rx.try_recv() {
            run_guarded(cb);
            ran += 1;
        }
        ran
    }

    /// Move the context onto a named thread. The thread runs callbacks until
    /// every `ContextPoster` has been dropped and the queue is empty.
    pub fn spawn(self, name: &str) -> io::Result<ContextThread> {
        let CallbackContext { tx, rx } = self;
        // Only outstanding posters keep the thread alive from here on.
        drop(tx);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut ran = 0;
                for cb in rx.iter() {
                    run_guarded(cb);
                    ran += 1;
                }
                debug!(ran, "callback context drained");
                ran
            })?;
        Ok(ContextThread { handle })
    }
}

/// Handle to a context running on its own thread.
pub struct ContextThread {
    handle: JoinHandle<usize>,
}

impl ContextThread {
    /// Wait for the thread to drain; returns how many callbacks it ran.
    pub fn join(self) -> usize {
        self.handle.join().unwrap_or_else(|payload| {
            warn!(panic = %panic_message(payload), "callback context thread panicked");
            0
        })
    }
}

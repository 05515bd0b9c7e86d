//! Relocation listener and event delivery.
//!
//! `Dispatch` picks how an event reaches the listener: called directly on the
//! task's thread, or posted to a `CallbackContext`.

use std::sync::Arc;

use crate::context::ContextPoster;
use crate::errors::FailReason;
use crate::record::DownloadRecord;

/// Receives the progress of a relocation.
///
/// `on_prepared` fires at most once, before exactly one of `on_success` /
/// `on_failed`.
pub trait RelocationListener: Send + Sync {
    fn on_prepared(&self, record: &DownloadRecord);
    fn on_success(&self, record: &DownloadRecord);
    /// `record` is `None` when no record existed for the url.
    fn on_failed(&self, record: Option<&DownloadRecord>, reason: &FailReason);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationEvent {
    Prepared(DownloadRecord),
    Success(DownloadRecord),
    Failed(Option<DownloadRecord>, FailReason),
}

impl RelocationEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RelocationEvent::Prepared(_))
    }

    fn deliver_to(&self, listener: &dyn RelocationListener) {
        match self {
            RelocationEvent::Prepared(r) => listener.on_prepared(r),
            RelocationEvent::Success(r) => listener.on_success(r),
            RelocationEvent::Failed(r, reason) => listener.on_failed(r.as_ref(), reason),
        }
    }
}

/// Delivery strategy, chosen when the task is built.
#[derive(Debug, Clone, Default)]
pub enum Dispatch {
    /// Call the listener on the task's own thread.
    #[default]
    Inline,
    /// Post to a designated execution context.
    Marshaled(ContextPoster),
}

impl Dispatch {
    pub fn is_inline(&self) -> bool {
        matches!(self, Dispatch::Inline)
    }
}

/// Deliver `event` to `listener` according to `mode`. No listener, no-op.
pub fn notify(
    event: RelocationEvent,
    listener: Option<&Arc<dyn RelocationListener>>,
    mode: &Dispatch,
) {
    let Some(listener) = listener else {
        return;
    };
    match mode {
        Dispatch::Inline => event.deliver_to(listener.as_ref()),
        Dispatch::Marshaled(poster) => {
            let listener = Arc::clone(listener);
            poster.post(move || event.deliver_to(listener.as_ref()));
        }
    }
}

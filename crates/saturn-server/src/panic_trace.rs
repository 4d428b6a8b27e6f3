//! Backtrace capture for panics raised inside job handlers.
//!
//! `catch_unwind` only hands back the payload, so a hook records the backtrace
//! of the panicking thread where the router can pick it up after recovery.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::sync::Once;

static INSTALL: Once = Once::new();

thread_local! {
    static LAST_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Install the capturing hook. Later calls are no-ops.
///
/// The previously installed hook still runs after the backtrace is recorded.
pub fn install() {
    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let trace = Backtrace::force_capture().to_string();
            LAST_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

/// Take the backtrace recorded for the most recent panic on this thread.
pub fn take() -> Option<String> {
    LAST_TRACE.with(|slot| slot.borrow_mut().take())
}

/// Render a panic payload as text.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

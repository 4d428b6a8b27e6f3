//! Interrupt sources raced against in-flight requests.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Something that may interrupt a running invocation.
#[async_trait]
pub trait InterruptSource: Send {
    /// Wait for the next interrupt and describe it. `None` means no interrupt
    /// can arrive any more.
    async fn recv(&mut self) -> Option<String>;
}

/// Process termination signals.
///
/// POSIX: SIGINT, SIGTERM, SIGQUIT and SIGUSR2. Elsewhere: Ctrl-C. The signals
/// are captured while at least one `OsSignals` is alive. Dropping the last one
/// puts back the dispositions that were in place before the first capture, so
/// a process embedding the client terminates on these signals again once no
/// invocation is waiting.
#[cfg(unix)]
pub struct OsSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
    user2: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    pub fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let (interrupt, terminate, quit, user2) = disposition::acquire(|| {
            Ok((
                signal(SignalKind::interrupt())?,
                signal(SignalKind::terminate())?,
                signal(SignalKind::quit())?,
                signal(SignalKind::user_defined2())?,
            ))
        })?;
        Ok(Self {
            interrupt,
            terminate,
            quit,
            user2,
        })
    }
}

#[cfg(unix)]
impl Drop for OsSignals {
    fn drop(&mut self) {
        disposition::release();
    }
}

/// Process-wide bookkeeping of the captured signal dispositions.
///
/// tokio installs its handler once per signal and never removes it, so the
/// handler is swapped in and out here around the lifetime of the listeners.
#[cfg(unix)]
mod disposition {
    use std::{io, mem, ptr};

    use once_cell::sync::Lazy;
    use parking_lot::Mutex;
    use tracing::warn;

    const SIGNALS: [libc::c_int; 4] = [libc::SIGINT, libc::SIGTERM, libc::SIGQUIT, libc::SIGUSR2];

    #[derive(Default)]
    struct Dispositions {
        /// Live listeners.
        active: usize,
        /// Actions in place before the first capture.
        original: Vec<libc::sigaction>,
        /// tokio's actions, empty until the first successful capture.
        listening: Vec<libc::sigaction>,
    }

    static DISPOSITIONS: Lazy<Mutex<Dispositions>> = Lazy::new(Default::default);

    /// Route the signals to tokio, then run `register` to create listeners.
    pub(super) fn acquire<T>(register: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
        let mut state = DISPOSITIONS.lock();
        if state.listening.is_empty() {
            state.original = snapshot()?;
        } else if state.active == 0 {
            install(&state.listening)?;
        }

        let listeners = match register() {
            Ok(listeners) => listeners,
            Err(err) => {
                if state.active == 0 {
                    install(&state.original)?;
                }
                return Err(err);
            }
        };
        if state.listening.is_empty() {
            state.listening = snapshot()?;
        }
        state.active += 1;
        Ok(listeners)
    }

    /// Forget one listener. The last one out restores the original actions.
    pub(super) fn release() {
        let mut state = DISPOSITIONS.lock();
        state.active = state.active.saturating_sub(1);
        if state.active == 0
            && let Err(err) = install(&state.original)
        {
            warn!(error = %err, "Failed to restore signal dispositions");
        }
    }

    #[cfg(test)]
    pub(super) fn active() -> usize {
        DISPOSITIONS.lock().active
    }

    fn snapshot() -> io::Result<Vec<libc::sigaction>> {
        SIGNALS
            .iter()
            .map(|&signo| {
                // SAFETY: a null new action only reads the current one
                let mut action: libc::sigaction = unsafe { mem::zeroed() };
                let rc = unsafe { libc::sigaction(signo, ptr::null(), &mut action) };
                if rc == 0 {
                    Ok(action)
                } else {
                    Err(io::Error::last_os_error())
                }
            })
            .collect()
    }

    fn install(actions: &[libc::sigaction]) -> io::Result<()> {
        for (&signo, action) in SIGNALS.iter().zip(actions) {
            // SAFETY: every action was read back from the kernel for this signal
            let rc = unsafe { libc::sigaction(signo, action, ptr::null_mut()) };
            if rc != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
#[async_trait]
impl InterruptSource for OsSignals {
    async fn recv(&mut self) -> Option<String> {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Some("SIGINT".to_string()),
            Some(()) = self.terminate.recv() => Some("SIGTERM".to_string()),
            Some(()) = self.quit.recv() => Some("SIGQUIT".to_string()),
            Some(()) = self.user2.recv() => Some("SIGUSR2".to_string()),
            else => None,
        }
    }
}

#[cfg(not(unix))]
pub struct OsSignals {
    _private: (),
}

#[cfg(not(unix))]
impl OsSignals {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self { _private: () })
    }
}

#[cfg(not(unix))]
#[async_trait]
impl InterruptSource for OsSignals {
    async fn recv(&mut self) -> Option<String> {
        tokio::signal::ctrl_c().await.ok().map(|()| "Ctrl-C".to_string())
    }
}

/// Interrupts delivered through a channel, for embedding and tests.
pub struct ChannelInterrupt {
    rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelInterrupt {
    /// Create the source and the sender that triggers it.
    pub fn new() -> (mpsc::UnboundedSender<String>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl InterruptSource for ChannelInterrupt {
    async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// A source that never fires.
pub struct NoInterrupt;

#[async_trait]
impl InterruptSource for NoInterrupt {
    async fn recv(&mut self) -> Option<String> {
        std::future::pending().await
    }
}

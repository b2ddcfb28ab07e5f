use crate::error::{PencilTextError, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Default)]
struct InterruptState {
    requested: AtomicBool,
    signals: AtomicUsize,
}

impl InterruptState {
    /// Records one Ctrl+C and returns how many have been received so far.
    fn record_signal(&self) -> usize {
        self.requested.store(true, Ordering::SeqCst);
        self.signals.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Cancellation flag polled between pages and between translation requests.
/// The first Ctrl+C lets the current item finish and unwinds with
/// [`PencilTextError::Cancelled`], so scratch directories are still dropped;
/// the second one exits at once.
#[derive(Debug, Clone)]
pub struct GracefulShutdown {
    state: Arc<InterruptState>,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let shutdown = Self::new_for_test();
        let state = shutdown.state.clone();

        ctrlc::set_handler(move || {
            if state.record_signal() == 1 {
                eprintln!("\n🛑 Stopping after the current page or text... (Ctrl+C again to quit now)");
            } else {
                eprintln!("\n💀 Quitting without cleanup");
                std::process::exit(FORCED_EXIT_CODE);
            }
        })
        .map_err(|e| PencilTextError::Config {
            message: format!("Failed to set signal handler: {}", e),
        })?;

        Ok(shutdown)
    }

    /// Flag without a signal handler; the process-wide handler can only be set once.
    pub fn new_for_test() -> Self {
        Self {
            state: Arc::new(InterruptState::default()),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.state.requested.load(Ordering::SeqCst)
    }

    pub fn check_shutdown(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(PencilTextError::Cancelled)
        }
    }

    pub fn request_shutdown(&self) {
        self.state.requested.store(true, Ordering::SeqCst);
    }
}

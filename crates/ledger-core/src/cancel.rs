use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared stop signal for a proof-of-work search.
///
/// Clones observe the same flag, so a caller can hand one clone to a mining
/// worker and keep another to abort it. An optional deadline trips the
/// signal on its own once it passes.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A signal that only trips when [`Cancellation::cancel`] is called.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn with_optional_deadline(timeout: Option<Duration>) -> Self {
        timeout.map_or_else(Self::new, Self::with_deadline)
    }

    /// Same flag, with a fresh deadline counted from now.
    pub fn deadline_after(&self, timeout: Option<Duration>) -> Self {
        Self {
            flag: Arc::clone(&self.flag),
            deadline: timeout.and_then(|t| Instant::now().checked_add(t)),
        }
    }

    /// Whether both handles trip on the same flag.
    pub fn shares_flag_with(&self, other: &Cancellation) -> bool {
        Arc::ptr_eq(&self.flag, &other.flag)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

//! Cancellation signal
//!
//! A fetch can be stopped through a watch channel flag, a deadline, or both.
//! Backoff sleeps and in-flight transport calls race against it.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Receiving side of a cancellation request
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Sending side of a cancellation request
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation of every fetch holding the paired signal
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        Self::default()
    }

    /// Create a linked handle/signal pair
    pub fn channel() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle { tx },
            Self {
                rx: Some(rx),
                deadline: None,
            },
        )
    }

    /// Also fire once `timeout` has elapsed from now
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Also fire at `deadline`
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Check without waiting
    pub fn is_cancelled(&self) -> bool {
        let flagged = self.rx.as_ref().is_some_and(|rx| *rx.borrow());
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        flagged || expired
    }

    /// Resolve once cancellation is requested or the deadline passes
    pub async fn cancelled(&self) {
        let flag = async {
            let Some(mut rx) = self.rx.clone() else {
                return std::future::pending::<()>().await;
            };
            loop {
                let cancelled = *rx.borrow_and_update();
                if cancelled {
                    return;
                }
                if rx.changed().await.is_err() {
                    // Handle dropped without cancelling
                    return std::future::pending::<()>().await;
                }
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = flag => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => flag.await,
        }
    }
}

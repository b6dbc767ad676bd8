//! Shutdown signalling for the node loop.
//!
//! The controller records why the node is stopping. Every [`ShutdownSignal`]
//! sees that reason, including signals taken after shutdown already fired.

use std::fmt;

use tokio::signal;
use tokio::sync::watch;

/// Why the node is stopping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Stopped from code, or the controller went away.
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShutdownReason::Interrupt => "SIGINT",
            ShutdownReason::Terminate => "SIGTERM",
            ShutdownReason::Requested => "requested",
        })
    }
}

/// Owns the shutdown state. The first reason recorded wins.
pub struct ShutdownController {
    tx: watch::Sender<Option<ShutdownReason>>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// A handle the node loop selects on.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Record `reason` and wake every signal. Returns `false` if shutdown
    /// had already been triggered.
    pub fn shutdown(&self, reason: ShutdownReason) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.tx.borrow()
    }

    /// Block until SIGINT, SIGTERM or a programmatic [`shutdown`](Self::shutdown),
    /// and return the reason that ended up recorded.
    pub async fn wait_for_signal(&self) -> ShutdownReason {
        let interrupt = async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for SIGINT");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let mut requested = self.signal();
        let reason = tokio::select! {
            _ = interrupt => ShutdownReason::Interrupt,
            _ = terminate => ShutdownReason::Terminate,
            reason = requested.triggered() => reason,
        };
        self.shutdown(reason);

        let reason = self.reason().unwrap_or(reason);
        tracing::info!(%reason, "shutdown triggered");
        reason
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a [`ShutdownController`].
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<ShutdownReason>>,
}

impl ShutdownSignal {
    /// Resolve once shutdown is triggered. Cancel safe.
    pub async fn triggered(&mut self) -> ShutdownReason {
        match self.rx.wait_for(Option::is_some).await {
            Ok(reason) => (*reason).unwrap_or(ShutdownReason::Requested),
            Err(_) => ShutdownReason::Requested,
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.rx.borrow().is_some()
    }
}

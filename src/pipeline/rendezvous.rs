//! Strict alternating handshake between downloader and tailor.
//!
//! Two capacity-1 channels form a ping-pong: the producer announces "new
//! data" and blocks until the consumer acknowledges the append has been
//! fully read. Neither side ever runs more than one step ahead, so the
//! tailor never observes a half-applied append and the poll loop is
//! throttled to the tailor's read speed.

use tokio::sync::mpsc;

/// Downloader-side handle.
pub struct Producer {
    data_ready: mpsc::Sender<()>,
    drained: mpsc::Receiver<()>,
}

/// Tailor-side handle.
pub struct Consumer {
    data_ready: mpsc::Receiver<()>,
    drained: mpsc::Sender<()>,
}

/// Create the two halves of the handshake.
pub fn rendezvous() -> (Producer, Consumer) {
    let (ready_tx, ready_rx) = mpsc::channel(1);
    let (drained_tx, drained_rx) = mpsc::channel(1);
    (
        Producer {
            data_ready: ready_tx,
            drained: drained_rx,
        },
        Consumer {
            data_ready: ready_rx,
            drained: drained_tx,
        },
    )
}

impl Producer {
    /// Announce new data and block until the consumer has drained it.
    /// Returns false once the consumer side is gone.
    pub async fn offer(&mut self) -> bool {
        if self.data_ready.send(()).await.is_err() {
            return false;
        }
        self.drained.recv().await.is_some()
    }
}

impl Consumer {
    /// Block until the producer announces new data.
    /// Returns false once the producer side is gone.
    pub async fn wait(&mut self) -> bool {
        self.data_ready.recv().await.is_some()
    }

    /// Acknowledge that the current append has been fully read. The strict
    /// alternation keeps the ack slot free, so this never blocks.
    pub fn complete(&mut self) -> bool {
        self.drained.try_send(()).is_ok()
    }
}

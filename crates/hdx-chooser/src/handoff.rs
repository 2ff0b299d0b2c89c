//! Resource hand-off
//!
//! A chooser opened on behalf of another context gets one end of a one-shot
//! channel; the opener keeps the other. Delivering consumes the sender, so a
//! second delivery cannot be written. The opener treats a closed channel as
//! cancellation.

use hdx_client::Resource;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Create the channel for one chooser invocation
pub fn channel() -> (HandoffSender, HandoffReceiver) {
    let (tx, rx) = oneshot::channel();
    (HandoffSender { tx }, HandoffReceiver { rx })
}

/// Chooser side of the hand-off
#[derive(Debug)]
pub struct HandoffSender {
    tx: oneshot::Sender<Resource>,
}

impl HandoffSender {
    /// Send the selected resource. Returns `false` if the opener is gone.
    pub fn deliver(self, resource: Resource) -> bool {
        let url = resource.url.clone();
        match self.tx.send(resource) {
            Ok(()) => {
                info!(url = %url, "Resource handed off");
                true
            }
            Err(_) => {
                debug!(url = %url, "Opener no longer listening");
                false
            }
        }
    }

    /// Whether the opener dropped its receiver
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Opener side of the hand-off
#[derive(Debug)]
pub struct HandoffReceiver {
    rx: oneshot::Receiver<Resource>,
}

impl HandoffReceiver {
    /// Wait for the selection; `None` means the chooser closed without one
    pub async fn wait(self) -> Option<Resource> {
        self.rx.await.ok()
    }

    /// Non-blocking check, for openers that poll
    pub fn try_take(&mut self) -> Option<Resource> {
        self.rx.try_recv().ok()
    }
}

/// How a selected resource leaves the chooser
#[derive(Debug)]
pub enum HandoffMode {
    /// Deliver to the context that opened the chooser
    Opener(HandoffSender),
    /// No opener: navigate to the download URL
    Standalone,
}

impl HandoffMode {
    pub fn is_opener(&self) -> bool {
        matches!(self, HandoffMode::Opener(_))
    }
}

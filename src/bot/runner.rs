//! Long-polling loop and its lifecycle handle

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ChatTransport, reply_for};
use crate::dataset::ForecastStore;
use crate::{Result, VitalAirError};

/// Pause after a failed poll before trying again
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Owner of a running bot task.
///
/// Dropping the handle also ends the loop, but without waiting for it.
pub struct BotHandle {
    shutdown: watch::Sender<bool>,
    running: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl BotHandle {
    /// Start polling `transport` on the current tokio runtime
    pub fn spawn<T>(transport: T, store: Arc<dyn ForecastStore>, poll_timeout_seconds: u32) -> Self
    where
        T: ChatTransport + 'static,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let running = Arc::new(AtomicBool::new(true));

        let poller = Poller {
            transport,
            store,
            poll_timeout_seconds,
            offset: 0,
        };
        let flag = running.clone();
        let task = tokio::spawn(async move {
            info!("Starting chat bot polling");
            poller.run(shutdown_rx).await;
            flag.store(false, Ordering::SeqCst);
            info!("Chat bot has stopped");
        });

        Self {
            shutdown,
            running,
            task,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the loop to stop and wait for it to finish
    pub async fn stop(self) -> Result<()> {
        info!("Stopping chat bot...");
        // Receiver is gone if the task already exited
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| VitalAirError::bot(format!("Bot task failed: {e}")))
    }

    /// Wait for the loop to end on its own
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| VitalAirError::bot(format!("Bot task failed: {e}")))
    }
}

struct Poller<T> {
    transport: T,
    store: Arc<dyn ForecastStore>,
    poll_timeout_seconds: u32,
    offset: i64,
}

impl<T: ChatTransport> Poller<T> {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        while !*shutdown.borrow() {
            let polled = tokio::select! {
                _ = shutdown.changed() => break,
                polled = self.transport.poll(self.offset, self.poll_timeout_seconds) => polled,
            };

            match polled {
                Ok(batch) => {
                    if let Some(next) = batch.next_offset {
                        self.offset = next;
                    }
                    for message in batch.messages {
                        self.answer(message.chat_id, &message.text).await;
                    }
                }
                Err(e) => {
                    warn!("Polling failed: {e}");
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        () = tokio::time::sleep(ERROR_BACKOFF) => {}
                    }
                }
            }
        }
    }

    async fn answer(&self, chat_id: i64, text: &str) {
        let Some(reply) = reply_for(text, self.store.as_ref()) else {
            debug!(chat_id, "Ignoring unsupported command");
            return;
        };
        if let Err(e) = self.transport.send(chat_id, &reply).await {
            warn!(chat_id, "Failed to send reply: {e}");
        }
    }
}

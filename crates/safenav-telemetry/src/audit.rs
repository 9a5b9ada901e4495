//! Fire-and-forget audit reporting
//!
//! The navigation path hands records to [`AuditService`], which queues them
//! on an unbounded channel. A dedicated writer thread drains the queue into
//! an [`AuditSink`] so storage latency never reaches the caller.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use safenav_core::{AuditReporter, AuditSink, BlockReason, BlockedAttempt, HistoryEntry};

/// Background audit writer
pub struct AuditService {
    sender: mpsc::UnboundedSender<AuditCommand>,
}

/// Commands sent to the background writer
enum AuditCommand {
    /// Append a blocked attempt
    Blocked(Box<BlockedAttempt>),

    /// Append a history entry
    History(Box<HistoryEntry>),

    /// Acknowledge once everything queued before it is written
    Flush(oneshot::Sender<()>),

    /// Stop the writer
    Shutdown,
}

impl AuditService {
    /// Start the writer thread over `sink`
    pub fn new(sink: Arc<dyn AuditSink>) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("safenav-audit".to_string())
            .spawn(move || {
                if let Err(e) = run_writer(sink, receiver) {
                    error!("Audit writer thread failed: {}", e);
                }
            })?;

        info!("Audit service started");
        Ok(Self { sender })
    }

    /// Queue a blocked attempt
    pub fn record_blocked(&self, attempt: BlockedAttempt) {
        self.send(AuditCommand::Blocked(Box::new(attempt)));
    }

    /// Queue a history entry
    pub fn record_history(&self, entry: HistoryEntry) {
        self.send(AuditCommand::History(Box::new(entry)));
    }

    /// Wait until every record queued so far has reached the sink
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        self.send(AuditCommand::Flush(ack));
        if done.await.is_err() {
            warn!("Audit writer stopped before flush completed");
        }
    }

    fn send(&self, command: AuditCommand) {
        if let Err(e) = self.sender.send(command) {
            warn!("Failed to queue audit record: {}", e);
        }
    }
}

impl AuditReporter for AuditService {
    fn log_blocked_attempt(&self, url: &str, reason: BlockReason, blocked_by: &str) {
        self.record_blocked(BlockedAttempt::new(url, reason, blocked_by));
    }

    fn log_navigation(
        &self,
        url: &str,
        title: &str,
        was_blocked: bool,
        reason: Option<BlockReason>,
        blocked_by: Option<&str>,
    ) {
        let mut entry = HistoryEntry::new(url, title);
        entry.was_blocked = was_blocked;
        entry.reason = reason;
        entry.blocked_by = blocked_by.map(str::to_string);
        self.record_history(entry);
    }
}

impl Drop for AuditService {
    fn drop(&mut self) {
        // Signal shutdown
        let _ = self.sender.send(AuditCommand::Shutdown);
    }
}

/// Background writer loop
fn run_writer(
    sink: Arc<dyn AuditSink>,
    mut receiver: mpsc::UnboundedReceiver<AuditCommand>,
) -> std::io::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        while let Some(cmd) = receiver.recv().await {
            match cmd {
                AuditCommand::Blocked(attempt) => {
                    if let Err(e) = sink.append_blocked_attempt(*attempt).await {
                        warn!("Failed to write blocked attempt: {}", e);
                    }
                }
                AuditCommand::History(entry) => {
                    if let Err(e) = sink.append_history(*entry).await {
                        warn!("Failed to write history entry: {}", e);
                    }
                }
                AuditCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
                AuditCommand::Shutdown => {
                    debug!("Audit writer shutting down");
                    break;
                }
            }
        }
    });

    Ok(())
}

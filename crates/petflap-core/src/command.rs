// ── Write command plumbing ──
//
// User writes flow through an mpsc channel to a single processor task,
// which serializes them against each other. Each envelope carries a
// oneshot responder so the caller gets the outcome of its own write.

use tokio::sync::oneshot;

use crate::error::CoreError;

/// A single requested state write.
#[derive(Debug, Clone)]
pub(crate) struct WriteCommand {
    pub key: String,
    pub value: bool,
}

/// Envelope sent through the command channel.
pub(crate) struct CommandEnvelope {
    pub command: WriteCommand,
    pub response_tx: oneshot::Sender<Result<(), CoreError>>,
}

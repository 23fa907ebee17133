use proto::Operation;
use tokio::sync::oneshot;
use tuple::{Template, Tuple};

/// WaitingClient parks a blocked operation inside a space: the template
/// it is matching for, a single-shot channel to deliver one tuple, and
/// the operation kind, which decides whether a delivery consumes the
/// tuple or merely observes it.
pub(crate) struct WaitingClient {
    template: Template,
    tx: oneshot::Sender<Tuple>,
    operation: Operation,
}

impl WaitingClient {
    pub(crate) fn new(template: Template, tx: oneshot::Sender<Tuple>, operation: Operation) -> Self {
        Self {
            template,
            tx,
            operation,
        }
    }

    pub(crate) fn template(&self) -> &Template {
        &self.template
    }

    pub(crate) fn is_consuming(&self) -> bool {
        self.operation.is_consuming()
    }

    /// Delivers a copy of `t`, consuming the waiter. Returns false if the
    /// waiting side has gone away.
    pub(crate) fn deliver(self, t: Tuple) -> bool {
        self.tx.send(t).is_ok()
    }
}

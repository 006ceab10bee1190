//! Serialized command queue into the host's main thread
//!
//! Host model calls are only legal on one thread. [`HostCommandQueue`] owns
//! that thread and processes commands strictly in arrival order; callers get
//! a future per command. A pick can be cancelled while it is still queued or
//! while the host is waiting for user input.

use lookup_core::{Context, Error, Result, Value};
use lookup_introspection::panic_message;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::target::{PickKind, SnoopTarget};

const QUEUE_CAPACITY: usize = 16;
const HOST_THREAD_NAME: &str = "host-main";

/// The host object model, called only from the host thread
pub trait HostModel: Send + Sync + 'static {
    /// Root values for a non-interactive target
    fn roots(&self, target: SnoopTarget, context: &Context) -> anyhow::Result<Vec<Value>>;

    /// Let the user pick a reference. `Ok(None)` means the user backed out.
    ///
    /// Implementations should poll `cancel` while waiting for input.
    fn pick(
        &self,
        kind: PickKind,
        context: &Context,
        cancel: &CancelSignal,
    ) -> anyhow::Result<Option<Value>>;
}

/// Shared cancellation flag for one pick
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub enum PickOutcome {
    Picked(Value),
    Cancelled,
}

/// A queued pick request
pub struct PickTicket {
    kind: PickKind,
    cancel: CancelSignal,
    outcome: oneshot::Receiver<Result<PickOutcome>>,
}

impl PickTicket {
    pub fn kind(&self) -> PickKind {
        self.kind
    }

    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the host thread to finish the pick
    pub async fn outcome(self) -> Result<PickOutcome> {
        self.outcome.await.map_err(|_| Error::QueueClosed)?
    }
}

enum Command {
    Roots {
        target: SnoopTarget,
        respond_to: oneshot::Sender<Result<Vec<Value>>>,
    },
    Pick {
        kind: PickKind,
        cancel: CancelSignal,
        respond_to: oneshot::Sender<Result<PickOutcome>>,
    },
}

/// Handle to the host thread
#[derive(Clone)]
pub struct HostCommandQueue {
    sender: mpsc::Sender<Command>,
}

impl HostCommandQueue {
    /// Spawn the host thread. It stops once every handle is dropped.
    pub fn start(host: Arc<dyn HostModel>, context: Context) -> Result<Self> {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let worker = HostWorker {
            host,
            context,
            receiver,
        };
        thread::Builder::new()
            .name(HOST_THREAD_NAME.to_string())
            .spawn(move || worker.run())?;
        Ok(Self { sender })
    }

    pub async fn roots(&self, target: SnoopTarget) -> Result<Vec<Value>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(Command::Roots { target, respond_to })
            .await
            .map_err(|_| Error::QueueClosed)?;
        response.await.map_err(|_| Error::QueueClosed)?
    }

    /// Queue a pick; the returned ticket resolves once the host is done
    pub async fn pick(&self, kind: PickKind) -> Result<PickTicket> {
        let (respond_to, outcome) = oneshot::channel();
        let cancel = CancelSignal::new();
        self.sender
            .send(Command::Pick {
                kind,
                cancel: cancel.clone(),
                respond_to,
            })
            .await
            .map_err(|_| Error::QueueClosed)?;
        Ok(PickTicket {
            kind,
            cancel,
            outcome,
        })
    }
}

struct HostWorker {
    host: Arc<dyn HostModel>,
    context: Context,
    receiver: mpsc::Receiver<Command>,
}

impl HostWorker {
    fn run(mut self) {
        info!("Host command queue started");
        while let Some(command) = self.receiver.blocking_recv() {
            match command {
                Command::Roots { target, respond_to } => {
                    let _ = respond_to.send(self.roots(target));
                }
                Command::Pick {
                    kind,
                    cancel,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.pick(kind, &cancel));
                }
            }
        }
        info!("Host command queue stopped");
    }

    fn roots(&self, target: SnoopTarget) -> Result<Vec<Value>> {
        debug!(snoop_target = %target, "Collecting roots");
        self.call(|host, context| host.roots(target, context))
    }

    fn pick(&self, kind: PickKind, cancel: &CancelSignal) -> Result<PickOutcome> {
        if cancel.is_cancelled() {
            debug!(%kind, "Pick cancelled before start");
            return Ok(PickOutcome::Cancelled);
        }
        debug!(%kind, "Waiting for pick");
        let picked = self.call(|host, context| host.pick(kind, context, cancel))?;
        match picked {
            Some(value) if !cancel.is_cancelled() => Ok(PickOutcome::Picked(value)),
            _ => Ok(PickOutcome::Cancelled),
        }
    }

    fn call<T>(
        &self,
        f: impl FnOnce(&dyn HostModel, &Context) -> anyhow::Result<T>,
    ) -> Result<T> {
        match catch_unwind(AssertUnwindSafe(|| f(self.host.as_ref(), &self.context))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Error::host(e.to_string())),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(error = %message, "Host call panicked");
                Err(Error::host(message))
            }
        }
    }
}

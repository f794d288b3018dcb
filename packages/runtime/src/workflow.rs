//! Workflow invocations started from user code.
//!
//! Each invocation is a small state machine
//! (idle → running → completed | failed | cancelled) with an append-only
//! log. Streamed events are drained by [`WorkflowManager::pump`]; nothing
//! blocks the render thread.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub type InvocationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStatus {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Idle => "idle",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    Status(String),
    Log(String),
    Completed(serde_json::Value),
    Failed(String),
}

/// What the execution service hands back for one invocation
pub enum WorkflowReply {
    Completed(serde_json::Value),
    Stream(WorkflowStream),
}

/// Receiving half of a streamed invocation
pub struct WorkflowStream {
    events: mpsc::UnboundedReceiver<WorkflowEvent>,
    cancel: Option<oneshot::Sender<()>>,
}

/// Sending half, held by the service while the workflow runs
pub struct WorkflowSink {
    events: mpsc::UnboundedSender<WorkflowEvent>,
    cancelled: oneshot::Receiver<()>,
}

impl WorkflowStream {
    pub fn channel() -> (WorkflowStream, WorkflowSink) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        (
            WorkflowStream {
                events: events_rx,
                cancel: Some(cancel_tx),
            },
            WorkflowSink {
                events: events_tx,
                cancelled: cancel_rx,
            },
        )
    }
}

impl WorkflowSink {
    pub fn status(&self, message: impl Into<String>) {
        let _ = self.events.send(WorkflowEvent::Status(message.into()));
    }

    pub fn log(&self, line: impl Into<String>) {
        let _ = self.events.send(WorkflowEvent::Log(line.into()));
    }

    pub fn complete(self, result: serde_json::Value) {
        let _ = self.events.send(WorkflowEvent::Completed(result));
    }

    pub fn fail(self, error: impl Into<String>) {
        let _ = self.events.send(WorkflowEvent::Failed(error.into()));
    }

    /// Whether the caller asked to cancel
    pub fn is_cancelled(&mut self) -> bool {
        !matches!(
            self.cancelled.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        )
    }
}

/// External workflow execution service
pub trait WorkflowService: Send + Sync {
    fn invoke(&self, name: &str, params: serde_json::Value) -> Result<WorkflowReply, String>;
}

/// Service used when none is configured; every invocation fails
pub struct NoWorkflows;

impl WorkflowService for NoWorkflows {
    fn invoke(&self, name: &str, _params: serde_json::Value) -> Result<WorkflowReply, String> {
        Err(format!("No workflow service is configured (invoking '{}')", name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationState {
    pub name: String,
    pub status: WorkflowStatus,
    /// Latest status message
    pub message: Option<String>,
    pub logs: Vec<String>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl InvocationState {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: WorkflowStatus::Idle,
            message: None,
            logs: Vec::new(),
            result: None,
            error: None,
        }
    }

    /// Apply one event; terminal states absorb everything
    pub fn apply(&mut self, event: WorkflowEvent) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        match event {
            WorkflowEvent::Status(message) => self.message = Some(message),
            WorkflowEvent::Log(line) => self.logs.push(line),
            WorkflowEvent::Completed(result) => {
                self.status = WorkflowStatus::Completed;
                self.result = Some(result);
            }
            WorkflowEvent::Failed(error) => {
                self.status = WorkflowStatus::Failed;
                self.error = Some(error);
            }
        }
        true
    }
}

struct Invocation {
    state: InvocationState,
    stream: Option<WorkflowStream>,
    /// Nobody observes it any more; dropped once finished
    released: bool,
}

pub struct WorkflowManager {
    service: Arc<dyn WorkflowService>,
    invocations: BTreeMap<InvocationId, Invocation>,
    next_id: InvocationId,
}

impl WorkflowManager {
    pub fn new(service: Arc<dyn WorkflowService>) -> Self {
        Self {
            service,
            invocations: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn start(&mut self, name: &str, params: serde_json::Value) -> InvocationId {
        let id = self.next_id;
        self.next_id += 1;

        let mut state = InvocationState::new(name);
        state.status = WorkflowStatus::Running;
        let mut stream = None;
        match self.service.invoke(name, params) {
            Ok(WorkflowReply::Completed(result)) => {
                state.apply(WorkflowEvent::Completed(result));
            }
            Ok(WorkflowReply::Stream(s)) => stream = Some(s),
            Err(error) => {
                warn!(workflow = name, %error, "Workflow invocation failed");
                state.apply(WorkflowEvent::Failed(error));
            }
        }
        debug!(workflow = name, id, status = state.status.as_str(), "Workflow started");
        self.invocations.insert(
            id,
            Invocation {
                state,
                stream,
                released: false,
            },
        );
        id
    }

    /// Explicit cancellation; false when the invocation already finished
    pub fn cancel(&mut self, id: InvocationId) -> bool {
        let Some(invocation) = self.invocations.get_mut(&id) else {
            return false;
        };
        if invocation.state.status.is_terminal() {
            return false;
        }
        if let Some(mut stream) = invocation.stream.take() {
            if let Some(cancel) = stream.cancel.take() {
                let _ = cancel.send(());
            }
        }
        invocation.state.status = WorkflowStatus::Cancelled;
        true
    }

    /// Forget an invocation its hook no longer points at. A finished one is
    /// dropped now; a running one keeps running and is dropped when it ends.
    pub fn release(&mut self, id: InvocationId) {
        let finished = match self.invocations.get_mut(&id) {
            Some(invocation) => {
                invocation.released = true;
                invocation.state.status.is_terminal()
            }
            None => return,
        };
        if finished {
            self.invocations.remove(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    /// Drain every pending event; returns how many were applied
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        for invocation in self.invocations.values_mut() {
            let Some(stream) = invocation.stream.as_mut() else {
                continue;
            };
            loop {
                match stream.events.try_recv() {
                    Ok(event) => {
                        if invocation.state.apply(event) {
                            applied += 1;
                        }
                    }
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        if invocation.state.apply(WorkflowEvent::Failed(
                            "Workflow stream closed before completion".to_string(),
                        )) {
                            applied += 1;
                        }
                        break;
                    }
                }
            }
            if invocation.state.status.is_terminal() {
                invocation.stream = None;
            }
        }
        self.invocations
            .retain(|_, invocation| !(invocation.released && invocation.state.status.is_terminal()));
        applied
    }

    pub fn state(&self, id: InvocationId) -> Option<&InvocationState> {
        self.invocations.get(&id).map(|invocation| &invocation.state)
    }

    pub fn running(&self) -> usize {
        self.invocations
            .values()
            .filter(|invocation| invocation.state.status == WorkflowStatus::Running)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct Scripted {
        sinks: Mutex<Vec<WorkflowSink>>,
    }

    impl WorkflowService for Scripted {
        fn invoke(&self, name: &str, params: serde_json::Value) -> Result<WorkflowReply, String> {
            match name {
                "echo" => Ok(WorkflowReply::Completed(params)),
                "stream" => {
                    let (stream, sink) = WorkflowStream::channel();
                    self.sinks.lock().unwrap().push(sink);
                    Ok(WorkflowReply::Stream(stream))
                }
                other => Err(format!("unknown workflow {}", other)),
            }
        }
    }

    fn manager() -> (WorkflowManager, Arc<Scripted>) {
        let service = Arc::new(Scripted {
            sinks: Mutex::new(Vec::new()),
        });
        (WorkflowManager::new(service.clone()), service)
    }

    #[test]
    fn test_synchronous_reply_completes_immediately() {
        let (mut manager, _) = manager();
        let id = manager.start("echo", json!({"x": 1}));
        let state = manager.state(id).unwrap();
        assert_eq!(state.status, WorkflowStatus::Completed);
        assert_eq!(state.result, Some(json!({"x": 1})));
    }

    #[test]
    fn test_service_error_is_a_failed_state() {
        let (mut manager, _) = manager();
        let id = manager.start("missing", json!(null));
        let state = manager.state(id).unwrap();
        assert_eq!(state.status, WorkflowStatus::Failed);
        assert!(state.error.as_deref().unwrap().contains("missing"));
    }

    #[test]
    fn test_stream_progress_then_completion() {
        let (mut manager, service) = manager();
        let id = manager.start("stream", json!(null));
        let sink = service.sinks.lock().unwrap().pop().unwrap();

        sink.status("fetching");
        sink.log("page 1");
        assert_eq!(manager.pump(), 2);
        let state = manager.state(id).unwrap();
        assert_eq!(state.status, WorkflowStatus::Running);
        assert_eq!(state.message.as_deref(), Some("fetching"));
        assert_eq!(state.logs, vec!["page 1"]);

        sink.complete(json!(42));
        manager.pump();
        assert_eq!(manager.state(id).unwrap().status, WorkflowStatus::Completed);
        assert_eq!(manager.running(), 0);
    }

    #[test]
    fn test_cancel_is_explicit_and_observed_by_service() {
        let (mut manager, service) = manager();
        let id = manager.start("stream", json!(null));
        let mut sink = service.sinks.lock().unwrap().pop().unwrap();
        assert!(!sink.is_cancelled());

        assert!(manager.cancel(id));
        assert!(sink.is_cancelled());
        sink.log("late");
        manager.pump();
        let state = manager.state(id).unwrap();
        assert_eq!(state.status, WorkflowStatus::Cancelled);
        assert!(state.logs.is_empty());
        assert!(!manager.cancel(id));
    }

    #[test]
    fn test_released_invocations_are_dropped_once_finished() {
        let (mut manager, service) = manager();
        let done = manager.start("echo", json!(1));
        let running = manager.start("stream", json!(null));
        let sink = service.sinks.lock().unwrap().pop().unwrap();
        assert_eq!(manager.len(), 2);

        manager.release(done);
        manager.release(running);
        assert!(manager.state(done).is_none());
        assert_eq!(manager.state(running).unwrap().status, WorkflowStatus::Running);

        sink.complete(json!(2));
        manager.pump();
        assert!(manager.is_empty());
    }

    #[test]
    fn test_dropped_sink_fails_running_invocation() {
        let (mut manager, service) = manager();
        let id = manager.start("stream", json!(null));
        drop(service.sinks.lock().unwrap().pop());
        manager.pump();
        assert_eq!(manager.state(id).unwrap().status, WorkflowStatus::Failed);
    }
}

//! Event bus for execution lifecycle events.
//!
//! Built on [`nebula_eventbus::Bus`], which gives every subscriber its own
//! bounded queue and an explicit backpressure flag: a slow subscriber must
//! never stall the publisher, and overflow must be observable rather than
//! silently swallowed.

use std::time::Duration;

use nebula_eventbus::Bus;
use serde::{Deserialize, Serialize};

/// Default per-subscriber bounded queue depth (`event.subscriberQueueDepth`).
pub const DEFAULT_SUBSCRIBER_QUEUE_DEPTH: usize = 256;

/// Execution lifecycle event.
///
/// These events are emitted by the engine, approval coordinator, and form
/// coordinator as executions progress. They are projections, **not** the
/// source of truth -- `nebula-persistence` is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    /// An execution has started.
    #[serde(rename = "EXECUTION_STARTED")]
    Started {
        /// The execution identifier.
        execution_id: String,
        /// The workflow identifier.
        workflow_id: String,
    },
    /// A node within an execution has started.
    #[serde(rename = "NODE_STARTED")]
    NodeStarted {
        /// The execution identifier.
        execution_id: String,
        /// The node identifier.
        node_id: String,
    },
    /// A node within an execution has completed.
    #[serde(rename = "NODE_COMPLETED")]
    NodeCompleted {
        /// The execution identifier.
        execution_id: String,
        /// The node identifier.
        node_id: String,
        /// How long the node took.
        duration: Duration,
    },
    /// A node within an execution has failed.
    #[serde(rename = "NODE_FAILED")]
    NodeFailed {
        /// The execution identifier.
        execution_id: String,
        /// The node identifier.
        node_id: String,
        /// Error description.
        error: String,
    },
    /// An execution has completed successfully.
    #[serde(rename = "EXECUTION_COMPLETED")]
    Completed {
        /// The execution identifier.
        execution_id: String,
        /// Total execution duration.
        duration: Duration,
    },
    /// An execution has failed.
    #[serde(rename = "EXECUTION_FAILED")]
    Failed {
        /// The execution identifier.
        execution_id: String,
        /// Error description.
        error: String,
    },
    /// An execution was cancelled.
    #[serde(rename = "EXECUTION_CANCELLED")]
    Cancelled {
        /// The execution identifier.
        execution_id: String,
    },
    /// An execution has suspended, waiting on an approval, form, or timer.
    #[serde(rename = "EXECUTION_WAITING")]
    Waiting {
        /// The execution identifier.
        execution_id: String,
        /// The node that caused the suspension.
        node_id: String,
        /// Why the execution suspended (`approval` | `form` | `wait` | `webhook`).
        reason: String,
    },
    /// An approval gate was created for a suspended execution.
    #[serde(rename = "APPROVAL_CREATED")]
    ApprovalCreated {
        /// The approval identifier.
        approval_id: String,
        /// The execution it gates.
        execution_id: String,
    },
    /// A user submitted an approve/reject decision.
    #[serde(rename = "APPROVAL_ACTION")]
    ApprovalAction {
        /// The approval identifier.
        approval_id: String,
        /// The acting user.
        user_id: String,
        /// `"approve"` or `"reject"`.
        action: String,
    },
    /// An approval reached a terminal resolution.
    #[serde(rename = "APPROVAL_RESOLVED")]
    ApprovalResolved {
        /// The approval identifier.
        approval_id: String,
        /// Final status (`approved` | `rejected` | `expired` | `cancelled`).
        status: String,
    },
}

/// Backpressure-aware event bus over [`ExecutionEvent`].
///
/// Delivers events to all active subscribers. If no subscribers are
/// listening, events are silently dropped (fire-and-forget).
///
/// # Examples
///
/// ```
/// use nebula_telemetry::event::{EventBus, ExecutionEvent};
///
/// let bus = EventBus::new(64);
/// let mut sub = bus.subscribe();
///
/// bus.emit(ExecutionEvent::Started {
///     execution_id: "exec-1".into(),
///     workflow_id: "wf-1".into(),
/// });
///
/// // In async context: let event = sub.recv().await;
/// assert_eq!(bus.total_emitted(), 1);
/// ```
pub struct EventBus {
    inner: Bus<ExecutionEvent>,
}

impl EventBus {
    /// Create a new event bus; `capacity` bounds each subscriber's queue.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Bus::new(capacity),
        }
    }

    /// Emit an event to all subscribers. Never blocks.
    ///
    /// Returns silently if there are no active subscribers.
    pub fn emit(&self, event: ExecutionEvent) {
        self.inner.publish(event);
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            inner: self.inner.subscribe(),
        }
    }

    /// Total number of events emitted since creation.
    #[must_use]
    pub fn total_emitted(&self) -> u64 {
        self.inner.total_published()
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriber_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_QUEUE_DEPTH)
    }
}

/// Subscription handle for receiving events from the [`EventBus`].
pub struct EventSubscriber {
    inner: nebula_eventbus::Subscriber<ExecutionEvent>,
}

impl EventSubscriber {
    /// Receive the next event, waiting asynchronously.
    ///
    /// Returns `None` once the bus has been dropped and the queue drained.
    pub async fn recv(&mut self) -> Option<ExecutionEvent> {
        self.inner.recv().await
    }

    /// Try to receive an event without blocking.
    ///
    /// Returns `None` if no event is immediately available.
    pub fn try_recv(&mut self) -> Option<ExecutionEvent> {
        self.inner.try_recv()
    }

    /// `true` if this subscriber has dropped events since its last
    /// successful, non-overflowing receive.
    #[must_use]
    pub fn is_backpressured(&self) -> bool {
        self.inner.is_backpressured()
    }
}

//! Event-driven metric collection.
//!
//! Derives counters and histograms from an
//! [`nebula_telemetry::event::EventBus`] subscription instead of requiring a
//! call site at every place an execution or node changes state. Whatever
//! emits events for observability (the scheduler, the approval coordinator)
//! gets metrics for free.

use std::sync::Arc;

use nebula_telemetry::event::{EventSubscriber, ExecutionEvent};
use nebula_telemetry::metrics::MetricsRegistry;

use crate::names;

/// Drain `subscriber` and update `registry` for every event, until the
/// owning [`nebula_telemetry::event::EventBus`] is dropped and the
/// subscription closes.
///
/// Takes an already-subscribed handle rather than the bus itself: the
/// caller must not also keep the bus alive from within the same spawned
/// task, or the subscription never closes. Intended to be spawned as its
/// own task by the composition root, the same way
/// [`nebula_approval::ApprovalCoordinator::spawn_expiration_sweep`] owns its
/// background loop.
pub async fn collect(mut subscriber: EventSubscriber, registry: Arc<MetricsRegistry>) {
    while let Some(event) = subscriber.recv().await {
        record(&registry, &event);
    }
}

fn record(registry: &MetricsRegistry, event: &ExecutionEvent) {
    match event {
        ExecutionEvent::Started { .. } => {
            registry.counter(names::EXECUTIONS_STARTED_TOTAL).inc();
        }
        ExecutionEvent::Completed { duration, .. } => {
            registry.counter(names::EXECUTIONS_COMPLETED_TOTAL).inc();
            registry
                .histogram(names::EXECUTION_DURATION_SECONDS)
                .observe(duration.as_secs_f64());
        }
        ExecutionEvent::Failed { .. } => {
            registry.counter(names::EXECUTIONS_FAILED_TOTAL).inc();
        }
        ExecutionEvent::Cancelled { .. } => {
            registry.counter(names::EXECUTIONS_CANCELLED_TOTAL).inc();
        }
        ExecutionEvent::NodeCompleted { duration, .. } => {
            registry.counter(names::ACTIONS_EXECUTED_TOTAL).inc();
            registry
                .histogram(names::ACTION_DURATION_SECONDS)
                .observe(duration.as_secs_f64());
        }
        ExecutionEvent::NodeFailed { .. } => {
            registry.counter(names::ACTIONS_FAILED_TOTAL).inc();
        }
        ExecutionEvent::ApprovalCreated { .. } => {
            registry.counter(names::APPROVALS_CREATED_TOTAL).inc();
        }
        ExecutionEvent::ApprovalResolved { status, .. } => {
            registry.counter(names::APPROVALS_RESOLVED_TOTAL).inc();
            if status == "expired" {
                registry.counter(names::APPROVALS_EXPIRED_TOTAL).inc();
            }
        }
        ExecutionEvent::NodeStarted { .. }
        | ExecutionEvent::Waiting { .. }
        | ExecutionEvent::ApprovalAction { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_telemetry::event::EventBus;
    use std::time::Duration;

    #[tokio::test]
    async fn collector_updates_registry_from_events() {
        let bus = EventBus::new(64);
        let subscriber = bus.subscribe();
        let registry = Arc::new(MetricsRegistry::new());

        let handle = tokio::spawn(collect(subscriber, Arc::clone(&registry)));

        bus.emit(ExecutionEvent::Started {
            execution_id: "e1".into(),
            workflow_id: "w1".into(),
        });
        bus.emit(ExecutionEvent::NodeCompleted {
            execution_id: "e1".into(),
            node_id: "n1".into(),
            duration: Duration::from_millis(250),
        });
        bus.emit(ExecutionEvent::Completed {
            execution_id: "e1".into(),
            duration: Duration::from_secs(1),
        });
        bus.emit(ExecutionEvent::ApprovalResolved {
            approval_id: "a1".into(),
            status: "expired".into(),
        });

        // Drop the bus so the subscriber's recv() loop terminates.
        drop(bus);
        handle.await.unwrap();

        assert_eq!(registry.counter(names::EXECUTIONS_STARTED_TOTAL).get(), 1);
        assert_eq!(registry.counter(names::EXECUTIONS_COMPLETED_TOTAL).get(), 1);
        assert_eq!(registry.counter(names::ACTIONS_EXECUTED_TOTAL).get(), 1);
        assert_eq!(registry.counter(names::APPROVALS_RESOLVED_TOTAL).get(), 1);
        assert_eq!(registry.counter(names::APPROVALS_EXPIRED_TOTAL).get(), 1);
        assert_eq!(registry.histogram(names::ACTION_DURATION_SECONDS).count(), 1);
    }
}

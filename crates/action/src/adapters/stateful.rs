//! Adapter for [`StatefulAction`] to [`InternalHandler`].

use std::sync::Arc;

use async_trait::async_trait;
use nebula_parameter::collection::ParameterCollection;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::action::Action;
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::handler::InternalHandler;
use crate::metadata::ActionMetadata;
use crate::output::ActionOutput;
use crate::result::{ActionResult, BreakReason};
use crate::types::StatefulAction;

/// Default maximum iterations to prevent infinite Continue loops.
const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Adapter that wraps a typed [`StatefulAction`] as an [`InternalHandler`].
///
/// Embeds the Continue/Break loop internally — the engine never sees
/// `ActionResult::Continue`. Each iteration calls `execute_with_state`,
/// and the adapter loops until a non-Continue result is produced or the
/// max iteration guard triggers.
pub struct StatefulActionAdapter<A> {
    action: Arc<A>,
    max_iterations: usize,
}

impl<A> StatefulActionAdapter<A> {
    /// Wrap a stateful action in an adapter with the default max iterations (10,000).
    pub fn new(action: A) -> Self {
        Self {
            action: Arc::new(action),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Wrap a stateful action with a custom max iterations guard.
    pub fn with_max_iterations(action: A, max_iterations: usize) -> Self {
        Self {
            action: Arc::new(action),
            max_iterations,
        }
    }
}

#[async_trait]
impl<A> InternalHandler for StatefulActionAdapter<A>
where
    A: StatefulAction + Send + Sync + 'static,
    A::Input: DeserializeOwned + Clone + Send + Sync + 'static,
    A::Output: Serialize + Send + Sync + 'static,
    A::State: Send + Sync + 'static,
{
    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: ActionContext,
    ) -> Result<ActionResult<serde_json::Value>, ActionError> {
        // 1. Deserialize JSON into typed input
        let typed_input: A::Input = serde_json::from_value(input)
            .map_err(|e| ActionError::validation(format!("input deserialization failed: {e}")))?;

        // 2. Initialize state
        let mut state = self.action.initialize_state(&typed_input, &ctx).await?;

        // 3. Continue/Break loop
        for _ in 0..self.max_iterations {
            ctx.check_cancelled()?;

            let result = self
                .action
                .execute_with_state(typed_input.clone(), &mut state, &ctx)
                .await?;

            match result {
                ActionResult::Continue { delay, .. } => {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    // Loop continues
                }
                other => {
                    // Any non-Continue result: serialize and return
                    return other.try_map_output(|output| {
                        serde_json::to_value(output).map_err(|e| {
                            ActionError::fatal(format!("output serialization failed: {e}"))
                        })
                    });
                }
            }
        }

        // Max iterations exceeded
        Ok(ActionResult::Break {
            output: ActionOutput::Empty,
            reason: BreakReason::MaxIterations,
        })
    }

    fn metadata(&self) -> &ActionMetadata {
        self.action.metadata()
    }

    fn action_type(&self) -> crate::metadata::ActionType {
        self.action.action_type()
    }

    fn parameters(&self) -> Option<&ParameterCollection> {
        self.action.parameters()
    }
}

impl<A: Action> std::fmt::Debug for StatefulActionAdapter<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatefulActionAdapter")
            .field("action_key", &self.action.metadata().key)
            .finish()
    }
}

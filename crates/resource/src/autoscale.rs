//! Auto-scaling policy and background scaler for resource pools.
//!
//! The [`AutoScaler`] monitors pool utilization and triggers scale-up or
//! scale-down operations when sustained watermark thresholds are breached.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// AutoScalePolicy
// ---------------------------------------------------------------------------

/// Policy controlling when and how aggressively the auto-scaler acts.
///
/// Utilization is calculated as `active / max_size`. When it exceeds
/// `high_watermark` for `evaluation_window`, the scaler pre-creates
/// `scale_up_step` idle instances. When it drops below `low_watermark`
/// for the same window, the scaler removes `scale_down_step` idle instances.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AutoScalePolicy {
    /// Utilization above which to scale up (0.0, 1.0]. Default: 0.8
    pub high_watermark: f64,
    /// Utilization below which to scale down [0.0, 1.0). Default: 0.2
    pub low_watermark: f64,
    /// Number of instances to pre-create when scaling up. Default: 2
    pub scale_up_step: usize,
    /// Number of idle instances to remove when scaling down. Default: 1
    pub scale_down_step: usize,
    /// How long utilization must exceed a watermark before action. Default: 30s
    pub evaluation_window: Duration,
    /// Minimum time between scale operations. Default: 60s
    pub cooldown: Duration,
}

impl Default for AutoScalePolicy {
    fn default() -> Self {
        Self {
            high_watermark: 0.8,
            low_watermark: 0.2,
            scale_up_step: 2,
            scale_down_step: 1,
            evaluation_window: Duration::from_secs(30),
            cooldown: Duration::from_secs(60),
        }
    }
}

impl AutoScalePolicy {
    /// Validate the policy, returning an error if any field is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.high_watermark <= 0.0 || self.high_watermark > 1.0 {
            return Err(Error::configuration("high_watermark must be in (0.0, 1.0]"));
        }
        if self.low_watermark < 0.0 || self.low_watermark >= 1.0 {
            return Err(Error::configuration("low_watermark must be in [0.0, 1.0)"));
        }
        if self.low_watermark >= self.high_watermark {
            return Err(Error::configuration(
                "low_watermark must be less than high_watermark",
            ));
        }
        if self.scale_up_step == 0 {
            return Err(Error::configuration("scale_up_step must be > 0"));
        }
        if self.scale_down_step == 0 {
            return Err(Error::configuration("scale_down_step must be > 0"));
        }
        if self.evaluation_window.is_zero() {
            return Err(Error::configuration(
                "evaluation_window must be greater than zero",
            ));
        }
        if self.cooldown.is_zero() {
            return Err(Error::configuration("cooldown must be greater than zero"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AutoScaler
// ---------------------------------------------------------------------------

/// Background auto-scaler that monitors pool utilization and triggers
/// scale-up / scale-down callbacks when sustained watermark thresholds
/// are breached.
///
/// The scaler is decoupled from `Pool` via closures, making it testable
/// and reusable across different pool implementations.
pub struct AutoScaler {
    policy: AutoScalePolicy,
    cancel: CancellationToken,
}

impl AutoScaler {
    /// Create a new auto-scaler with the given policy and cancellation token.
    ///
    /// Call [`validate`](AutoScalePolicy::validate) on the policy before
    /// constructing if you want early validation.
    #[must_use]
    pub fn new(policy: AutoScalePolicy, cancel: CancellationToken) -> Self {
        Self { policy, cancel }
    }

    /// Spawn the background auto-scaler task.
    ///
    /// - `get_stats`: Returns current `(active, idle, max_size)`.
    /// - `scale_up`: Called with the count of instances to pre-create.
    ///   Returns the number actually created.
    /// - `scale_down`: Called with the count of idle instances to remove.
    ///   Returns the number actually removed.
    ///
    /// The task checks utilization every `evaluation_window / 2` and
    /// respects the cooldown between scale operations.
    ///
    /// Returns a [`JoinHandle`](tokio::task::JoinHandle) that can be
    /// awaited to confirm the background task has fully exited after
    /// [`shutdown`](Self::shutdown) is called.
    pub fn start<S, U, D, UF, DF>(
        &self,
        get_stats: S,
        scale_up: U,
        scale_down: D,
    ) -> tokio::task::JoinHandle<()>
    where
        S: Fn() -> (usize, usize, usize) + Send + Sync + 'static,
        U: Fn(usize) -> UF + Send + Sync + 'static,
        UF: Future<Output = usize> + Send,
        D: Fn(usize) -> DF + Send + Sync + 'static,
        DF: Future<Output = usize> + Send,
    {
        let policy = self.policy.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let check_interval = policy.evaluation_window / 2;

            // Tracks when utilization first exceeded / went below watermarks.
            let mut high_since: Option<Instant> = None;
            let mut low_since: Option<Instant> = None;
            let mut last_scale_op: Option<Instant> = None;

            loop {
                tokio::select! {
                    () = tokio::time::sleep(check_interval) => {}
                    () = cancel.cancelled() => break,
                }

                let (active, _idle, max_size) = get_stats();
                let utilization = if max_size == 0 {
                    0.0
                } else {
                    active as f64 / max_size as f64
                };

                let now = Instant::now();
                let in_cooldown =
                    last_scale_op.is_some_and(|t| now.duration_since(t) < policy.cooldown);

                // Track high watermark breach
                high_since = if utilization > policy.high_watermark {
                    Some(high_since.unwrap_or(now))
                } else {
                    None
                };

                // Track low watermark breach
                low_since = if utilization < policy.low_watermark {
                    Some(low_since.unwrap_or(now))
                } else {
                    None
                };

                // Scale up if sustained above high watermark
                if let Some(since) = high_since.filter(|_| !in_cooldown)
                    && now.duration_since(since) >= policy.evaluation_window
                {
                    let _created = scale_up(policy.scale_up_step).await;
                    last_scale_op = Some(Instant::now());
                    high_since = None;
                }

                // Scale down if sustained below low watermark
                if let Some(since) = low_since.filter(|_| !in_cooldown)
                    && now.duration_since(since) >= policy.evaluation_window
                {
                    let _removed = scale_down(policy.scale_down_step).await;
                    last_scale_op = Some(Instant::now());
                    low_since = None;
                }
            }
        })
    }

    /// Cancel the background auto-scaler task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for AutoScaler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoScaler")
            .field("policy", &self.policy)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

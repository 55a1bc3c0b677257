//! Sentry and log-bridge wiring, folded into the subscriber built by
//! [`super::LoggerBuilder`].

#[cfg(feature = "sentry")]
use tracing_subscriber::layer::SubscriberExt as _;

macro_rules! attach_sentry {
    ($subscriber:expr) => {{
        #[cfg(feature = "sentry")]
        {
            $subscriber.with(sentry_tracing::layer())
        }
        #[cfg(not(feature = "sentry"))]
        {
            $subscriber
        }
    }};
}

/// Initialize Sentry (if a DSN is configured and the `sentry` feature is on)
/// and bridge the `log` crate into `tracing` (if `log-compat` is on).
pub(crate) fn init_telemetry(_inner: &mut super::Inner) {
    #[cfg(feature = "sentry")]
    {
        if let Ok(dsn) = std::env::var("NEBULA_SENTRY_DSN") {
            let guard = sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    ..Default::default()
                },
            ));
            _inner.sentry_guard = Some(guard);
        }
    }

    #[cfg(feature = "log-compat")]
    {
        let _ = tracing_log::LogTracer::init();
    }
}

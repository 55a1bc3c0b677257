//! Format layer creation macros.
//!
//! Factored out of `build()` because the three branches (pretty/compact/json)
//! differ only in which `tracing_subscriber::fmt::Layer` builder method is
//! called; the `with_ansi`/`with_target`/`with_writer`/`with_timer` chain is
//! otherwise identical.

macro_rules! create_fmt_layer {
    (pretty, $display:expr, $writer:expr) => {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi($display.colors)
            .with_target($display.source)
            .with_writer($writer)
            .with_timer(crate::format::make_timer(None))
    };
    (compact, $display:expr, $writer:expr) => {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi($display.colors)
            .with_target($display.source)
            .with_writer($writer)
            .with_timer(crate::format::make_timer(None))
    };
}

macro_rules! create_json_layer {
    ($display:expr, $writer:expr) => {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event($display.flatten)
            .with_ansi(false)
            .with_target($display.source)
            .with_writer($writer)
            .with_timer(crate::format::make_timer(None))
    };
}

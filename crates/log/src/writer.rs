//! Writer construction for the configured [`crate::config::WriterConfig`].

use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::WriterConfig;
use crate::core::LogResult;

#[cfg(feature = "file")]
pub type WriterGuard = tracing_appender::non_blocking::WorkerGuard;
#[cfg(not(feature = "file"))]
pub type WriterGuard = ();

pub fn make_writer(cfg: &WriterConfig) -> LogResult<(BoxMakeWriter, Vec<WriterGuard>)> {
    match cfg {
        WriterConfig::Stdout => Ok((BoxMakeWriter::new(std::io::stdout), Vec::new())),
        WriterConfig::Stderr => Ok((BoxMakeWriter::new(std::io::stderr), Vec::new())),
        #[cfg(feature = "file")]
        WriterConfig::File { directory, file_name } => {
            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            Ok((BoxMakeWriter::new(non_blocking), vec![guard]))
        }
    }
}

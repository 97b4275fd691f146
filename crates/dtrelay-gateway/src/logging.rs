//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over `logging.filter`. With `logging.dir` set, output is
//! appended to `<dir>/<file>` without ANSI colours; if that file cannot be
//! opened the subscriber writes to stderr and says so.
//!
//! Work that runs before the config is known (loading the config itself) is
//! wrapped in `with_bootstrap`, which logs to stderr only.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingSection;

fn open_log_file(cfg: &LoggingSection) -> Option<io::Result<(PathBuf, File)>> {
    let dir = cfg.dir.as_ref()?;
    let path = dir.join(&cfg.file);
    Some(
        fs::create_dir_all(dir)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(&path))
            .map(|f| (path, f)),
    )
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(cfg: &LoggingSection) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.filter));

    match open_log_file(cfg) {
        Some(Ok((path, file))) => {
            fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
            tracing::debug!(path = %path.display(), "logging to file");
        }
        Some(Err(e)) => {
            fmt().with_env_filter(filter).with_writer(io::stderr).init();
            tracing::warn!(error = %e, "log file unavailable, logging to stderr");
        }
        None => {
            fmt().with_env_filter(filter).with_writer(io::stderr).init();
        }
    }
}

/// Run `f` under a temporary stderr subscriber (`RUST_LOG`, else `info`).
pub fn with_bootstrap<T>(f: impl FnOnce() -> T) -> T {
    with_bootstrap_writer(io::stderr, f)
}

fn with_bootstrap_writer<W, T>(writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(writer).finish();
    tracing::subscriber::with_default(subscriber, f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn bootstrap_logs_before_init() {
        let out = Captured::default();
        let value = with_bootstrap_writer(out.clone(), || {
            tracing::error!(config = "missing.yaml", "config load failed");
            7
        });

        assert_eq!(value, 7);
        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("config load failed"), "{text}");
        assert!(text.contains("missing.yaml"), "{text}");
    }
}

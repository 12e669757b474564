//! Logging capability injected into the engine instead of process-wide
//! logger state. Every call site that would otherwise reach for `log::info!`
//! takes `&dyn Logger` and calls through it.

/// A sink for engine diagnostics. Implementations decide where messages go;
/// the engine never assumes a global logger is configured.
pub trait Logger {
    fn error(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn info(&self, msg: &str);
    fn debug(&self, msg: &str);
}

/// Writes `LEVEL message` lines to stderr. Stdout is reserved for the
/// single-line result JSON document, so diagnostics never land there.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn error(&self, msg: &str) {
        eprintln!("ERROR {msg}");
    }

    fn warn(&self, msg: &str) {
        eprintln!("WARN  {msg}");
    }

    fn info(&self, msg: &str) {
        eprintln!("INFO  {msg}");
    }

    fn debug(&self, msg: &str) {
        eprintln!("DEBUG {msg}");
    }
}

/// Discards everything. Used in tests so assertions aren't interleaved with
/// diagnostic noise.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn error(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingLogger {
        lines: RefCell<Vec<String>>,
    }

    impl Logger for RecordingLogger {
        fn error(&self, msg: &str) {
            self.lines.borrow_mut().push(format!("ERROR {msg}"));
        }
        fn warn(&self, msg: &str) {
            self.lines.borrow_mut().push(format!("WARN {msg}"));
        }
        fn info(&self, msg: &str) {
            self.lines.borrow_mut().push(format!("INFO {msg}"));
        }
        fn debug(&self, msg: &str) {
            self.lines.borrow_mut().push(format!("DEBUG {msg}"));
        }
    }

    #[test]
    fn test_logger_is_object_safe_and_injectable() {
        let logger = RecordingLogger::default();
        fn use_logger(l: &dyn Logger) {
            l.warn("skipping degenerate part");
        }
        use_logger(&logger);
        assert_eq!(logger.lines.borrow()[0], "WARN skipping degenerate part");
    }

    #[test]
    fn test_null_logger_does_not_panic() {
        let logger = NullLogger;
        logger.error("x");
        logger.warn("x");
        logger.info("x");
        logger.debug("x");
    }
}

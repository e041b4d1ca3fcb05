//! Observers for the parser's recursive descent.
//!
//! A [`Tracer`] is told about every production and token the parser tries,
//! with the chain of rules that led there (`start->script_line->command`).
//! Tracing has no effect on parse results. Without a tracer the parser does
//! not build the paths at all.

/// Receives narration of the recursive descent.
pub trait Tracer {
    /// A rule or token is about to be tried.
    fn attempt(&mut self, path: &str);

    /// The attempt matched; the cursor is now at token index `end`.
    fn success(&mut self, path: &str, end: usize);

    /// The attempt did not match.
    fn failure(&mut self, path: &str);
}

/// Forwards parse narration to the `log` crate at trace level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn attempt(&mut self, path: &str) {
        log::trace!("{}?", path);
    }

    fn success(&mut self, path: &str, end: usize) {
        log::trace!("{} = ..{}!", path, end);
    }

    fn failure(&mut self, path: &str) {
        log::trace!("{} not found", path);
    }
}

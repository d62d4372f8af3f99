//! Progress notifications emitted while a mesh is being read.

/// Receives progress checkpoints from the parser.
///
/// `phase` is one of `"nodes"`, `"elements"` and `"boundary"`; `fraction`
/// is the overall progress in `[0, 1]` and never decreases.
pub trait ProgressReporter {
    fn report(&mut self, phase: &str, fraction: f64);
}

/// Ignores all notifications.
impl ProgressReporter for () {
    fn report(&mut self, _phase: &str, _fraction: f64) {}
}

impl<F> ProgressReporter for F
where
    F: FnMut(&str, f64),
{
    fn report(&mut self, phase: &str, fraction: f64) {
        self(phase, fraction)
    }
}

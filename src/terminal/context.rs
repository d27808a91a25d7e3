//! Context: an enter/exit bracket around one piece of terminal state.

use super::TermIo;
use std::io;

/// A side-effecting terminal setting that must be undone.
///
/// Contexts are entered in order when the terminal activates and exited in
/// reverse order when it deactivates. A context may be entered and exited
/// several times (suspend/resume); `close` runs once, at the very end, even
/// if the last exit failed.
pub trait Context: Send {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Apply the setting, remembering whatever is needed to undo it.
    fn enter(&mut self, io: &mut TermIo) -> io::Result<()>;

    /// Undo what `enter` did.
    fn exit(&mut self, io: &mut TermIo) -> io::Result<()>;

    /// Release resources held across enter/exit cycles.
    fn close(&mut self) {}
}

/// A context built from a pair of closures.
pub struct FnContext<E, X> {
    name: &'static str,
    enter: E,
    exit: X,
}

impl<E, X> FnContext<E, X>
where
    E: FnMut(&mut TermIo) -> io::Result<()> + Send,
    X: FnMut(&mut TermIo) -> io::Result<()> + Send,
{
    /// Create a context that calls `enter` and `exit`.
    pub const fn new(name: &'static str, enter: E, exit: X) -> Self {
        Self { name, enter, exit }
    }
}

impl<E, X> Context for FnContext<E, X>
where
    E: FnMut(&mut TermIo) -> io::Result<()> + Send,
    X: FnMut(&mut TermIo) -> io::Result<()> + Send,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn enter(&mut self, io: &mut TermIo) -> io::Result<()> {
        (self.enter)(io)
    }

    fn exit(&mut self, io: &mut TermIo) -> io::Result<()> {
        (self.exit)(io)
    }
}

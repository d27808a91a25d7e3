//! Signal channels: OS signals forwarded into crossbeam channels.
//!
//! Each channel is a [`Context`]. Entering registers the handlers and starts a
//! forwarding thread; exiting unregisters them and joins the thread, so no
//! handler outlives the terminal session.

use super::context::Context;
use super::TermIo;
use crossbeam_channel::{bounded, Receiver, Sender};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use signal_hook::iterator::{Handle, Signals};
use std::io;
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Queue depth; repeated signals beyond it are dropped.
const CAPACITY: usize = 16;

/// A channel of signal numbers.
pub struct SignalChannel {
    name: &'static str,
    signals: Vec<i32>,
    tx: Sender<i32>,
    rx: Receiver<i32>,
    handle: Option<Handle>,
    thread: Option<JoinHandle<()>>,
}

impl SignalChannel {
    /// A channel fed by the OS signals `signals` while entered.
    pub fn new(name: &'static str, signals: &[i32]) -> Self {
        let (tx, rx) = bounded(CAPACITY);
        Self {
            name,
            signals: signals.to_vec(),
            tx,
            rx,
            handle: None,
            thread: None,
        }
    }

    /// A channel fed only through [`send`](Self::send).
    pub fn synthetic(name: &'static str) -> Self {
        Self::new(name, &[])
    }

    /// The receiving end.
    #[inline]
    pub const fn receiver(&self) -> &Receiver<i32> {
        &self.rx
    }

    /// A sender for injecting signals.
    pub fn sender(&self) -> Sender<i32> {
        self.tx.clone()
    }

    /// Deliver `sig` as if the OS had.
    pub fn send(&self, sig: i32) {
        if self.tx.try_send(sig).is_err() {
            debug!(channel = self.name, sig, "signal queue full");
        }
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Context for SignalChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn enter(&mut self, _io: &mut TermIo) -> io::Result<()> {
        if self.signals.is_empty() || self.thread.is_some() {
            return Ok(());
        }
        let mut signals = Signals::new(&self.signals)?;
        let handle = signals.handle();
        let tx = self.tx.clone();
        let thread = thread::Builder::new()
            .name(format!("treadmill-{}", self.name))
            .spawn(move || {
                for sig in signals.forever() {
                    let _ = tx.try_send(sig);
                }
            });
        match thread {
            Ok(thread) => {
                info!(channel = self.name, signals = ?self.signals, "signal handlers installed");
                self.handle = Some(handle);
                self.thread = Some(thread);
                Ok(())
            }
            Err(e) => {
                handle.close();
                Err(e)
            }
        }
    }

    fn exit(&mut self, _io: &mut TermIo) -> io::Result<()> {
        self.stop();
        Ok(())
    }

    fn close(&mut self) {
        self.stop();
    }
}

/// Stop the process group and block until `SIGCONT`.
pub(super) fn stop_and_wait() -> io::Result<()> {
    let mut cont = Signals::new([libc::SIGCONT])?;
    if let Err(e) = kill(Pid::from_raw(0), Signal::SIGTSTP) {
        cont.handle().close();
        return Err(e.into());
    }
    let _ = cont.forever().next();
    cont.handle().close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::Term;
    use nix::sys::signal::raise;
    use std::time::Duration;

    #[test]
    fn test_synthetic_send() {
        let chan = SignalChannel::synthetic("halt");
        chan.send(libc::SIGTERM);
        chan.sender().send(libc::SIGINT).unwrap();
        assert_eq!(chan.receiver().try_recv().unwrap(), libc::SIGTERM);
        assert_eq!(chan.receiver().try_recv().unwrap(), libc::SIGINT);
    }

    #[test]
    fn test_full_queue_drops() {
        let chan = SignalChannel::synthetic("resize");
        for _ in 0..CAPACITY + 4 {
            chan.send(libc::SIGWINCH);
        }
        assert_eq!(chan.receiver().len(), CAPACITY);
    }

    #[test]
    fn test_os_signal_is_forwarded() {
        let chan = SignalChannel::new("user", &[libc::SIGUSR2]);
        let rx = chan.receiver().clone();
        let mut term = Term::headless(Vec::new(), 10, 3);
        term.push(Box::new(chan));
        term.run_with(|_| {
            raise(Signal::SIGUSR2).unwrap();
            let sig = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(sig, libc::SIGUSR2);
            Ok(())
        })
        .unwrap();
    }
}

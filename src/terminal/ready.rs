//! Input readiness: a poller thread that reports when the terminal has bytes.
//!
//! The poller notifies at most once, then waits for the loop to acknowledge
//! that it has read. It polls with a short timeout so it notices shutdown
//! promptly.

use super::context::Context;
use super::TermIo;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::io;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Poll timeout in milliseconds.
const POLL_TIMEOUT_MS: libc::c_int = 50;

/// Input readiness notifications as a context.
pub struct InputReady {
    ready_tx: Sender<()>,
    ready_rx: Receiver<()>,
    ack_tx: Sender<()>,
    ack_rx: Receiver<()>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl InputReady {
    /// A readiness channel with no poller running.
    pub fn new() -> Self {
        let (ready_tx, ready_rx) = bounded(1);
        let (ack_tx, ack_rx) = bounded(1);
        Self {
            ready_tx,
            ready_rx,
            ack_tx,
            ack_rx,
            shutdown: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// Receives one `()` per readiness notification.
    #[inline]
    pub const fn receiver(&self) -> &Receiver<()> {
        &self.ready_rx
    }

    /// A sender the loop uses to acknowledge a read.
    pub fn ack_sender(&self) -> Sender<()> {
        self.ack_tx.clone()
    }

    /// Acknowledge the last notification so the poller resumes.
    pub fn ack(&self) {
        let _ = self.ack_tx.try_send(());
    }

    /// Report readiness without a poller; used by headless terminals.
    pub fn notify(&self) {
        let _ = self.ready_tx.try_send(());
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        while self.ready_rx.try_recv().is_ok() {}
        while self.ack_rx.try_recv().is_ok() {}
    }

    fn run_loop(fd: RawFd, ready: &Sender<()>, ack: &Receiver<()>, shutdown: &AtomicBool) {
        let wait = Duration::from_millis(POLL_TIMEOUT_MS.unsigned_abs().into());
        'poll: while !shutdown.load(Ordering::Relaxed) {
            match poll_readable(fd, POLL_TIMEOUT_MS) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    debug!(error = %e, "input poll failed");
                    break;
                }
            }
            if let Err(TrySendError::Disconnected(())) = ready.try_send(()) {
                break;
            }
            loop {
                if shutdown.load(Ordering::Relaxed) {
                    break 'poll;
                }
                match ack.recv_timeout(wait) {
                    Ok(()) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break 'poll,
                }
            }
        }
    }
}

impl Default for InputReady {
    fn default() -> Self {
        Self::new()
    }
}

impl Context for InputReady {
    fn name(&self) -> &'static str {
        "input-ready"
    }

    fn enter(&mut self, io: &mut TermIo) -> io::Result<()> {
        let Some(fd) = io.input_fd() else {
            return Ok(());
        };
        if self.thread.is_some() {
            return Ok(());
        }
        self.shutdown.store(false, Ordering::Relaxed);
        let ready = self.ready_tx.clone();
        let ack = self.ack_rx.clone();
        let shutdown = Arc::clone(&self.shutdown);
        let thread = thread::Builder::new()
            .name("treadmill-input".to_string())
            .spawn(move || Self::run_loop(fd, &ready, &ack, &shutdown))?;
        self.thread = Some(thread);
        Ok(())
    }

    fn exit(&mut self, _io: &mut TermIo) -> io::Result<()> {
        self.stop();
        Ok(())
    }

    fn close(&mut self) {
        self.stop();
    }
}

/// Wait up to `timeout_ms` for `fd` to become readable.
///
/// Hang-up and error conditions count as readable so the next read observes
/// them. An interrupted poll reports not ready.
fn poll_readable(fd: RawFd, timeout_ms: libc::c_int) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    // SAFETY: `pfd` is a valid pollfd and the count is 1.
    #[allow(unsafe_code)]
    let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    if pfd.revents & libc::POLLNVAL != 0 {
        return Err(io::Error::from_raw_os_error(libc::EBADF));
    }
    Ok(rc > 0 && pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::os::fd::AsRawFd;

    fn pipe() -> (File, File) {
        let (r, w) = nix::unistd::pipe().unwrap();
        (File::from(r), File::from(w))
    }

    #[test]
    fn test_poll_readable() {
        let (r, mut w) = pipe();
        assert!(!poll_readable(r.as_raw_fd(), 0).unwrap());
        w.write_all(b"x").unwrap();
        assert!(poll_readable(r.as_raw_fd(), 0).unwrap());
    }

    #[test]
    fn test_hangup_counts_as_ready() {
        let (r, w) = pipe();
        drop(w);
        assert!(poll_readable(r.as_raw_fd(), 0).unwrap());
    }

    #[test]
    fn test_poller_notifies_once_until_ack() {
        let (r, mut w) = pipe();
        let ready = InputReady::new();
        let (tx, rx, ack) = (ready.ready_tx.clone(), ready.receiver().clone(), ready.ack_rx.clone());
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let fd = r.as_raw_fd();
        let thread = thread::spawn(move || InputReady::run_loop(fd, &tx, &ack, &flag));

        w.write_all(b"abc").unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        // Still readable, but unacknowledged: no second notification.
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        ready.ack();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        shutdown.store(true, Ordering::Relaxed);
        thread.join().unwrap();
    }

    #[test]
    fn test_notify_without_poller() {
        let ready = InputReady::new();
        ready.notify();
        ready.notify();
        assert_eq!(ready.receiver().len(), 1);
    }
}

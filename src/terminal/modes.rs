//! Concrete terminal contexts: line discipline, DEC private modes and
//! non-blocking descriptors.

use super::context::Context;
use super::output::OutputBuffer;
use super::TermIo;
use bitflags::bitflags;
use crossterm::{cursor, queue, terminal};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::termios::{
    cfmakeraw, tcgetattr, tcsetattr, LocalFlags, SetArg, SpecialCharacterIndices, Termios,
};
use std::io::{self, Write};
use std::os::fd::RawFd;

/// Snapshots `termios` on enter and restores it on exit.
///
/// Depending on construction it turns echo off, or switches to raw mode
/// (no canonical line editing, no signal keys, no flow control, no CR
/// translation, no output post-processing).
pub struct TermiosContext {
    raw: bool,
    saved: Option<Termios>,
}

impl TermiosContext {
    /// Raw mode: Ctrl-C, Ctrl-Z and friends arrive as bytes.
    pub const fn raw() -> Self {
        Self {
            raw: true,
            saved: None,
        }
    }

    /// Only disable echo; the line discipline stays canonical.
    pub const fn echo_off() -> Self {
        Self {
            raw: false,
            saved: None,
        }
    }

    fn configure(&self, t: &mut Termios) {
        t.local_flags.remove(LocalFlags::ECHO | LocalFlags::ECHONL);
        if self.raw {
            cfmakeraw(t);
            t.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
            t.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        }
    }
}

impl Context for TermiosContext {
    fn name(&self) -> &'static str {
        "termios"
    }

    fn enter(&mut self, io: &mut TermIo) -> io::Result<()> {
        let Some(input) = io.input_file() else {
            return Ok(());
        };
        let saved = tcgetattr(input)?;
        let mut t = saved.clone();
        self.configure(&mut t);
        tcsetattr(input, SetArg::TCSANOW, &t)?;
        self.saved = Some(saved);
        Ok(())
    }

    fn exit(&mut self, io: &mut TermIo) -> io::Result<()> {
        match (self.saved.take(), io.input_file()) {
            (Some(saved), Some(input)) => Ok(tcsetattr(input, SetArg::TCSANOW, &saved)?),
            _ => Ok(()),
        }
    }
}

bitflags! {
    /// Mouse reporting modes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseModes: u8 {
        /// Button press/release (1000).
        const CLICK = 1 << 0;
        /// Motion while a button is held (1002).
        const DRAG = 1 << 1;
        /// All motion (1003).
        const MOTION = 1 << 2;
        /// SGR extended coordinates (1006).
        const SGR = 1 << 3;
    }
}

impl MouseModes {
    const CODES: [(Self, u16); 4] = [
        (Self::CLICK, 1000),
        (Self::DRAG, 1002),
        (Self::MOTION, 1003),
        (Self::SGR, 1006),
    ];

    /// Button and drag reporting with SGR coordinates.
    pub const DEFAULT_REPORTING: Self = Self::CLICK.union(Self::DRAG).union(Self::SGR);

    fn codes(self) -> impl DoubleEndedIterator<Item = u16> {
        Self::CODES
            .into_iter()
            .filter(move |(m, _)| self.contains(*m))
            .map(|(_, code)| code)
    }
}

/// Sets DEC private modes on enter and resets them on exit.
///
/// Exit always ends with an attribute reset and a visible cursor.
pub struct ModeContext {
    alt_screen: bool,
    hide_cursor: bool,
    mouse: MouseModes,
}

impl ModeContext {
    /// A context for the given modes.
    pub const fn new(alt_screen: bool, hide_cursor: bool, mouse: MouseModes) -> Self {
        Self {
            alt_screen,
            hide_cursor,
            mouse,
        }
    }
}

impl Context for ModeContext {
    fn name(&self) -> &'static str {
        "modes"
    }

    fn enter(&mut self, io: &mut TermIo) -> io::Result<()> {
        if self.alt_screen {
            queue!(io, terminal::EnterAlternateScreen)?;
        }
        if self.hide_cursor {
            queue!(io, cursor::Hide)?;
        }
        let mut out = OutputBuffer::with_capacity(32);
        for code in self.mouse.codes() {
            out.dec_mode(code, true);
        }
        io.write_all(out.as_bytes())?;
        io.flush()
    }

    fn exit(&mut self, io: &mut TermIo) -> io::Result<()> {
        let mut out = OutputBuffer::with_capacity(32);
        for code in self.mouse.codes().rev() {
            out.dec_mode(code, false);
        }
        out.reset_attrs();
        io.write_all(out.as_bytes())?;
        if self.alt_screen {
            queue!(io, terminal::LeaveAlternateScreen)?;
        }
        queue!(io, cursor::Show)?;
        io.flush()
    }
}

/// Sets `O_NONBLOCK` on the terminal descriptors, restoring prior flags.
#[derive(Default)]
pub struct NonblockContext {
    saved: Vec<(RawFd, OFlag)>,
}

impl NonblockContext {
    /// A context with nothing saved yet.
    pub const fn new() -> Self {
        Self { saved: Vec::new() }
    }
}

fn get_flags(fd: RawFd) -> io::Result<OFlag> {
    Ok(OFlag::from_bits_retain(fcntl(fd, FcntlArg::F_GETFL)?))
}

fn set_flags(fd: RawFd, flags: OFlag) -> io::Result<()> {
    fcntl(fd, FcntlArg::F_SETFL(flags))?;
    Ok(())
}

impl Context for NonblockContext {
    fn name(&self) -> &'static str {
        "nonblock"
    }

    fn enter(&mut self, io: &mut TermIo) -> io::Result<()> {
        for fd in io.fds() {
            let flags = get_flags(fd)?;
            set_flags(fd, flags | OFlag::O_NONBLOCK)?;
            self.saved.push((fd, flags));
        }
        Ok(())
    }

    fn exit(&mut self, _io: &mut TermIo) -> io::Result<()> {
        let mut first = Ok(());
        while let Some((fd, flags)) = self.saved.pop() {
            if let Err(e) = set_flags(fd, flags) {
                if first.is_ok() {
                    first = Err(e);
                }
            }
        }
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogBuffer;
    use crate::terminal::{Output, Term};

    #[test]
    fn test_mouse_codes_order() {
        let codes: Vec<u16> = MouseModes::DEFAULT_REPORTING.codes().collect();
        assert_eq!(codes, [1000, 1002, 1006]);
        assert_eq!(MouseModes::empty().codes().count(), 0);
    }

    #[test]
    fn test_mode_context_round_trip() {
        let log = LogBuffer::new();
        let mut term = Term::headless(log.clone(), 10, 3);
        term.push(Box::new(ModeContext::new(true, true, MouseModes::SGR)));
        term.run_with(|_| Ok(())).unwrap();
        let text = log.contents();
        let enter = text.find("\x1b[?1049h").unwrap();
        let hide = text.find("\x1b[?25l").unwrap();
        let mouse_on = text.find("\x1b[?1006h").unwrap();
        let mouse_off = text.find("\x1b[?1006l").unwrap();
        let leave = text.find("\x1b[?1049l").unwrap();
        assert!(enter < hide && hide < mouse_on && mouse_on < mouse_off);
        assert!(mouse_off < leave);
        assert!(text.ends_with("\x1b[?25h"));
        assert!(text.contains("\x1b[0m"));
    }

    #[test]
    fn test_fd_contexts_are_noops_headless() {
        let mut term = Term::headless(Vec::new(), 10, 3);
        term.push(Box::new(TermiosContext::raw()));
        term.push(Box::new(NonblockContext::new()));
        term.run_with(|_| Ok(())).unwrap();
    }

    fn pty_io() -> Option<(TermIo, std::os::fd::OwnedFd)> {
        let pty = nix::pty::openpty(None, None).ok()?;
        let io = TermIo {
            input: Some(std::fs::File::from(pty.slave)),
            output: Output::Writer(Box::new(Vec::new())),
        };
        Some((io, pty.master))
    }

    #[test]
    fn test_raw_mode_round_trip_on_pty() {
        let Some((mut io, _master)) = pty_io() else {
            return;
        };
        let before = tcgetattr(io.input_file().unwrap()).unwrap();
        assert!(before.local_flags.contains(LocalFlags::ICANON));

        let mut ctx = TermiosContext::raw();
        ctx.enter(&mut io).unwrap();
        let raw = tcgetattr(io.input_file().unwrap()).unwrap();
        assert!(!raw
            .local_flags
            .intersects(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::ISIG));
        assert_eq!(raw.control_chars[SpecialCharacterIndices::VMIN as usize], 1);

        ctx.exit(&mut io).unwrap();
        let after = tcgetattr(io.input_file().unwrap()).unwrap();
        assert_eq!(after.local_flags, before.local_flags);
        assert_eq!(after.input_flags, before.input_flags);
    }

    #[test]
    fn test_echo_off_keeps_canonical_mode() {
        let Some((mut io, _master)) = pty_io() else {
            return;
        };
        let mut ctx = TermiosContext::echo_off();
        ctx.enter(&mut io).unwrap();
        let t = tcgetattr(io.input_file().unwrap()).unwrap();
        assert!(!t.local_flags.contains(LocalFlags::ECHO));
        assert!(t.local_flags.contains(LocalFlags::ICANON));
        ctx.exit(&mut io).unwrap();
        let t = tcgetattr(io.input_file().unwrap()).unwrap();
        assert!(t.local_flags.contains(LocalFlags::ECHO));
    }

    #[test]
    fn test_nonblock_restores_flags() {
        let Some((mut io, _master)) = pty_io() else {
            return;
        };
        let fd = io.input_fd().unwrap();
        let mut ctx = NonblockContext::new();
        ctx.enter(&mut io).unwrap();
        assert!(get_flags(fd).unwrap().contains(OFlag::O_NONBLOCK));
        ctx.exit(&mut io).unwrap();
        assert!(!get_flags(fd).unwrap().contains(OFlag::O_NONBLOCK));
    }
}

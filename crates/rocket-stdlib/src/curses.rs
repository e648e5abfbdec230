//! curses: Minimal full-screen terminal control
//!
//! One terminal session per process, held in a [`SessionSlot`]. Output is
//! queued as ANSI sequences and written on `refresh()`. When stdin is a TTY
//! the session switches it to raw mode and restores the saved attributes when
//! it ends.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Read, Write};
use std::rc::Rc;

use mlua::{Lua, Table};
use rocket_bridge::{new_module, record, BridgeError, MethodTable, SessionSlot};

const ENTER_ALT_SCREEN: &str = "\x1b[?1049h\x1b[H";
const LEAVE_ALT_SCREEN: &str = "\x1b[?1049l";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Streams and geometry a terminal session runs on.
pub struct TerminalIo {
    /// Key input
    pub input: Box<dyn Read>,
    /// Screen output
    pub output: Box<dyn Write>,
    /// Columns and rows
    pub size: (u16, u16),
}

impl TerminalIo {
    /// Process stdin/stdout, sized from the controlling terminal.
    pub fn stdio() -> Self {
        TerminalIo {
            input: Box::new(io::stdin()),
            output: Box::new(io::stdout()),
            size: window_size().unwrap_or((80, 24)),
        }
    }
}

impl fmt::Debug for TerminalIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalIo").field("size", &self.size).finish()
    }
}

/// Factory for the streams of a new session.
pub type TerminalOpener = Rc<dyn Fn() -> io::Result<TerminalIo>>;

// ── Raw Mode ──

#[cfg(unix)]
struct RawMode {
    original: libc::termios,
}

#[cfg(unix)]
impl RawMode {
    /// Switch stdin to raw mode if it is a terminal
    fn enable() -> Option<RawMode> {
        // SAFETY: isatty is safe for any fd
        if unsafe { libc::isatty(0) } == 0 {
            return None;
        }
        // SAFETY: tcgetattr/tcsetattr are safe with valid fd and termios
        let mut original: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(0, &mut original) } != 0 {
            tracing::warn!("tcgetattr failed; staying in cooked mode");
            return None;
        }
        let mut raw = original;
        raw.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
        raw.c_cflag |= libc::CS8;
        raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        if unsafe { libc::tcsetattr(0, libc::TCSAFLUSH, &raw) } != 0 {
            tracing::warn!("tcsetattr failed; staying in cooked mode");
            return None;
        }
        Some(RawMode { original })
    }
}

#[cfg(unix)]
impl Drop for RawMode {
    fn drop(&mut self) {
        // SAFETY: restoring attributes captured by tcgetattr
        if unsafe { libc::tcsetattr(0, libc::TCSAFLUSH, &self.original) } != 0 {
            tracing::warn!("failed to restore terminal attributes");
        }
    }
}

#[cfg(not(unix))]
struct RawMode;

#[cfg(not(unix))]
impl RawMode {
    fn enable() -> Option<RawMode> {
        None
    }
}

#[cfg(unix)]
fn window_size() -> Option<(u16, u16)> {
    // SAFETY: ioctl with TIOCGWINSZ is safe on a valid fd (stdout=1)
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let ret = unsafe { libc::ioctl(1, libc::TIOCGWINSZ, &mut ws) };
    if ret == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some((ws.ws_col, ws.ws_row))
    } else {
        None
    }
}

#[cfg(not(unix))]
fn window_size() -> Option<(u16, u16)> {
    None
}

// ── Session ──

/// An open terminal session.
pub struct TermSession {
    io: TerminalIo,
    pending: String,
    _raw: Option<RawMode>,
}

impl TermSession {
    fn open(mut io: TerminalIo, raw: Option<RawMode>) -> io::Result<Self> {
        io.output.write_all(ENTER_ALT_SCREEN.as_bytes())?;
        io.output.flush()?;
        Ok(TermSession {
            io,
            pending: String::new(),
            _raw: raw,
        })
    }

    /// Read one byte; `-1` at end of input
    pub fn getch(&mut self) -> io::Result<i64> {
        let mut byte = [0u8; 1];
        match self.io.input.read(&mut byte)? {
            0 => Ok(-1),
            _ => Ok(i64::from(byte[0])),
        }
    }

    /// Queue `text` at column `x`, row `y` (0-based)
    pub fn print_at(&mut self, text: &str, x: u32, y: u32) {
        let (row, column) = (y.saturating_add(1), x.saturating_add(1));
        self.pending
            .push_str(&format!("\x1b[{};{}H{}", row, column, text));
    }

    /// Queue a screen clear
    pub fn clear(&mut self) {
        self.pending.push_str(CLEAR_SCREEN);
    }

    /// Write queued output
    pub fn refresh(&mut self) -> io::Result<()> {
        self.io.output.write_all(self.pending.as_bytes())?;
        self.pending.clear();
        self.io.output.flush()
    }

    /// Columns and rows
    pub fn size(&self) -> (u16, u16) {
        self.io.size
    }
}

impl Drop for TermSession {
    fn drop(&mut self) {
        let result = self
            .io
            .output
            .write_all(LEAVE_ALT_SCREEN.as_bytes())
            .and_then(|_| self.io.output.flush());
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to leave alternate screen");
        }
    }
}

/// The process terminal: a session slot plus how to open it.
pub struct Terminal {
    slot: RefCell<SessionSlot<TermSession>>,
    opener: TerminalOpener,
    raw_mode: bool,
}

impl Terminal {
    /// Terminal on process stdio, using raw mode when stdin is a TTY
    pub fn stdio() -> Self {
        Terminal {
            slot: RefCell::new(SessionSlot::new("curses")),
            opener: Rc::new(|| Ok::<_, io::Error>(TerminalIo::stdio())),
            raw_mode: true,
        }
    }

    /// Terminal on injected streams, never touching the TTY
    pub fn with_opener(opener: TerminalOpener) -> Self {
        Terminal {
            slot: RefCell::new(SessionSlot::new("curses")),
            opener,
            raw_mode: false,
        }
    }

    /// Open the session; `false` if it was already open
    pub fn init(&self) -> io::Result<bool> {
        let raw_mode = self.raw_mode;
        self.slot.borrow_mut().init_with(|| {
            let io = (self.opener)()?;
            let raw = if raw_mode { RawMode::enable() } else { None };
            TermSession::open(io, raw)
        })
    }

    /// End the session if one is open
    pub fn end(&self) -> bool {
        self.slot.borrow_mut().shutdown().is_some()
    }

    /// Check whether a session is open
    pub fn is_active(&self) -> bool {
        self.slot.borrow().is_active()
    }

    /// Run `f` against the open session
    pub fn with_session<R>(
        &self,
        f: impl FnOnce(&mut TermSession) -> io::Result<R>,
    ) -> mlua::Result<R> {
        let mut slot = self.slot.borrow_mut();
        let session = slot.get_mut()?;
        f(session).map_err(mlua::Error::external)
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Publish the `curses` module over `terminal`.
pub fn install(lua: &Lua, terminal: &Rc<Terminal>) -> mlua::Result<Table> {
    let init = terminal.clone();
    let end = terminal.clone();
    let getch = terminal.clone();
    let printw = terminal.clone();
    let clear = terminal.clone();
    let refresh = terminal.clone();
    let size = terminal.clone();

    let functions = MethodTable::new()
        .add(lua, "initscr", move |_, ()| {
            match init.init() {
                Ok(_) => Ok(()),
                Err(err) => Err(BridgeError::Allocation(format!("curses: {}", err)).into()),
            }
        })?
        .add(lua, "endwin", move |_, ()| {
            end.end();
            Ok(())
        })?
        .add(lua, "getch", move |_, ()| getch.with_session(|s| s.getch()))?
        .add(lua, "printw", move |_, (text, x, y): (String, u32, u32)| {
            printw.with_session(|s| {
                s.print_at(&text, x, y);
                Ok(())
            })
        })?
        .add(lua, "clear", move |_, ()| {
            clear.with_session(|s| {
                s.clear();
                Ok(())
            })
        })?
        .add(lua, "refresh", move |_, ()| refresh.with_session(|s| s.refresh()))?
        .add(lua, "size", move |lua, ()| {
            let (width, height) = size.with_session(|s| Ok(s.size()))?;
            record(lua, &[("width", f64::from(width)), ("height", f64::from(height))])
        })?;
    new_module(lua, "curses", &functions)
}

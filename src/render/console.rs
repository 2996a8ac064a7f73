//! Minimal color console: text, "color for the next write", restore, clear.

use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Gray,
}

pub trait Console {
    fn write_str(&mut self, text: &str) -> io::Result<()>;
    fn set_color(&mut self, color: Color) -> io::Result<()>;
    /// Return to the terminal's default foreground.
    fn restore_color(&mut self) -> io::Result<()>;
    fn clear(&mut self) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Console over any writer using SGR escape sequences.
///
/// With colors off, color calls are no-ops and `clear` prints nothing, so
/// redirected output stays plain text.
pub struct AnsiConsole<W: Write> {
    out: W,
    colors: bool,
}

impl<W: Write> AnsiConsole<W> {
    pub fn new(out: W, colors: bool) -> Self {
        Self { out, colors }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn escape(&mut self, seq: &str) -> io::Result<()> {
        if self.colors {
            self.out.write_all(seq.as_bytes())?;
        }
        Ok(())
    }
}

impl<W: Write> Console for AnsiConsole<W> {
    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    fn set_color(&mut self, color: Color) -> io::Result<()> {
        self.escape(match color {
            Color::Red => "\x1b[91m",
            Color::Green => "\x1b[92m",
            Color::Gray => "\x1b[90m",
        })
    }

    fn restore_color(&mut self) -> io::Result<()> {
        self.escape("\x1b[39m")
    }

    fn clear(&mut self) -> io::Result<()> {
        self.escape("\x1b[2J\x1b[H")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Console on stdout; colors only when stdout is a terminal that accepts
/// escape sequences.
pub fn stdout_console() -> AnsiConsole<io::Stdout> {
    use std::io::IsTerminal;
    let out = io::stdout();
    let colors = out.is_terminal() && enable_virtual_terminal();
    AnsiConsole::new(out, colors)
}

/// Switch the Windows console host into VT mode so SGR sequences render.
#[cfg(windows)]
pub fn enable_virtual_terminal() -> bool {
    use windows_sys::Win32::System::Console::{
        ENABLE_VIRTUAL_TERMINAL_PROCESSING, GetConsoleMode, GetStdHandle, STD_OUTPUT_HANDLE,
        SetConsoleMode,
    };

    unsafe {
        let handle = GetStdHandle(STD_OUTPUT_HANDLE);
        let mut mode = 0u32;
        if GetConsoleMode(handle, &mut mode) == 0 {
            return false;
        }
        mode & ENABLE_VIRTUAL_TERMINAL_PROCESSING != 0
            || SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING) != 0
    }
}

#[cfg(not(windows))]
pub fn enable_virtual_terminal() -> bool {
    true
}

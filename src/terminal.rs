use std::fmt;
use std::io::{self, stdout};

use crossterm::cursor::{Hide, Show};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{Command, execute};

use crate::view::TermSize;

/// X10-compatible mouse reporting: press events only, `ESC [ M b x y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableMouseReporting;

impl Command for EnableMouseReporting {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        f.write_str("\x1b[?1000h")
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisableMouseReporting;

impl Command for DisableMouseReporting {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        f.write_str("\x1b[?1000l")
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Raw mode, alternate screen and hidden cursor for as long as it lives.
pub struct TerminalGuard {
    mouse: bool,
}

impl TerminalGuard {
    pub fn enter(mouse: bool) -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard { mouse };
        execute!(stdout(), EnterAlternateScreen, Hide)?;
        if mouse {
            execute!(stdout(), EnableMouseReporting)?;
        }
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore(self.mouse);
    }
}

/// Best effort: undo everything `TerminalGuard::enter` may have done.
pub fn restore(mouse: bool) {
    if mouse {
        let _ = execute!(stdout(), DisableMouseReporting);
    }
    let _ = execute!(stdout(), Show, LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Restore the terminal before the previous hook reports a panic.
pub fn install_panic_hook(mouse: bool) {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore(mouse);
        original_hook(panic_info);
    }));
}

/// Current size, or 24x80 when it cannot be determined.
pub fn size() -> TermSize {
    match crossterm::terminal::size() {
        Ok((columns, rows)) if columns > 0 && rows > 0 => TermSize { rows, columns },
        _ => TermSize::FALLBACK,
    }
}

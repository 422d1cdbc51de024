use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use log::{trace, warn};
use std::io;
use std::time::Duration;

/// Watches the terminal for the keys that end a session: `q`, Esc, Ctrl-C.
///
/// Puts the terminal in raw mode for as long as it lives. Controller input
/// for the running program is not wired up; other keys are discarded.
pub struct QuitKeys {
    quit: bool,
}

impl QuitKeys {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(QuitKeys { quit: false })
    }

    /// drain pending events without blocking; sticky once set
    pub fn quit_requested(&mut self) -> Result<bool, io::Error> {
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => match evt.code {
                    KeyCode::Esc | KeyCode::Char('q') => self.quit = true,
                    KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.quit = true
                    }
                    other => trace!("ignoring key {:?}", other),
                },
                _ => trace!("ignoring non-key event"),
            }
        }
        Ok(self.quit)
    }
}

impl Drop for QuitKeys {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("couldn't restore terminal: {}", e);
        }
    }
}

//! Interactive terminal attached to a remote shell
//!
//! The local terminal is put in raw mode and keyboard events are translated
//! to the byte sequences a remote PTY expects. Ctrl+] detaches.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, size};
use tokio::sync::mpsc;

use hp_core::traits::{ShellHandle, ShellOutput, TerminalSize};

/// Size of the local terminal, or 80x24 when it cannot be queried
pub fn terminal_size() -> TerminalSize {
    match size() {
        Ok((cols, rows)) => TerminalSize { cols, rows },
        Err(_) => TerminalSize::default(),
    }
}

/// Leaves raw mode when dropped, including on early returns
struct RawMode;

impl RawMode {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Run the interactive session
///
/// Returns when the remote shell closes or the user detaches (Ctrl+]),
/// with the exit status if the shell reported one.
pub async fn run(mut shell: ShellHandle) -> Result<Option<u32>> {
    let raw = RawMode::enter()?;
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    // Create channel for terminal events
    let (event_tx, mut event_rx) = mpsc::channel::<Event>(256);

    // crossterm reads block, so poll them from a blocking task
    let event_handle = tokio::task::spawn_blocking(move || loop {
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(evt) = event::read() {
                if event_tx.blocking_send(evt).is_err() {
                    break;
                }
            }
        } else if event_tx.is_closed() {
            break;
        }
    });

    let mut exit_status = None;

    loop {
        tokio::select! {
            Some(evt) = event_rx.recv() => match evt {
                Event::Key(KeyEvent { code, modifiers, kind, .. }) if kind != KeyEventKind::Release => {
                    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char(']') {
                        tracing::debug!("Detached from shell");
                        break;
                    }

                    let data = key_to_bytes(code, modifiers);
                    if !data.is_empty() && shell.write(&data).await.is_err() {
                        break;
                    }
                }
                Event::Paste(text) => {
                    if shell.write(text.as_bytes()).await.is_err() {
                        break;
                    }
                }
                Event::Resize(cols, rows) => {
                    let _ = shell.resize(TerminalSize { cols, rows }).await;
                }
                _ => {}
            },

            output = shell.read() => match output {
                Some(ShellOutput::Stdout(data)) => {
                    stdout.write_all(&data)?;
                    stdout.flush()?;
                }
                Some(ShellOutput::Stderr(data)) => {
                    stderr.write_all(&data)?;
                    stderr.flush()?;
                }
                Some(ShellOutput::Exit(code)) => exit_status = Some(code),
                None => break,
            },
        }
    }

    // Cleanup
    drop(event_rx);
    event_handle.abort();
    let _ = shell.close().await;
    drop(raw);

    Ok(exit_status)
}

/// Convert a key event to bytes to send to the terminal
fn key_to_bytes(code: KeyCode, modifiers: KeyModifiers) -> Vec<u8> {
    use KeyCode::*;

    match code {
        Char(c) => {
            if modifiers.contains(KeyModifiers::CONTROL) {
                control_byte(c).map_or_else(|| utf8(c), |b| vec![b])
            } else if modifiers.contains(KeyModifiers::ALT) {
                // Alt+key sends ESC followed by the key
                let mut bytes = vec![0x1b];
                bytes.extend(utf8(c));
                bytes
            } else {
                utf8(c)
            }
        }
        Enter => vec![b'\r'],
        Tab => vec![b'\t'],
        BackTab => vec![0x1b, b'[', b'Z'],
        Backspace => vec![0x7f],
        Esc => vec![0x1b],
        Up => vec![0x1b, b'[', b'A'],
        Down => vec![0x1b, b'[', b'B'],
        Right => vec![0x1b, b'[', b'C'],
        Left => vec![0x1b, b'[', b'D'],
        Home => vec![0x1b, b'[', b'H'],
        End => vec![0x1b, b'[', b'F'],
        PageUp => vec![0x1b, b'[', b'5', b'~'],
        PageDown => vec![0x1b, b'[', b'6', b'~'],
        Delete => vec![0x1b, b'[', b'3', b'~'],
        Insert => vec![0x1b, b'[', b'2', b'~'],
        F(n) => {
            // F1-F12 escape sequences
            match n {
                1 => vec![0x1b, b'O', b'P'],
                2 => vec![0x1b, b'O', b'Q'],
                3 => vec![0x1b, b'O', b'R'],
                4 => vec![0x1b, b'O', b'S'],
                5 => vec![0x1b, b'[', b'1', b'5', b'~'],
                6 => vec![0x1b, b'[', b'1', b'7', b'~'],
                7 => vec![0x1b, b'[', b'1', b'8', b'~'],
                8 => vec![0x1b, b'[', b'1', b'9', b'~'],
                9 => vec![0x1b, b'[', b'2', b'0', b'~'],
                10 => vec![0x1b, b'[', b'2', b'1', b'~'],
                11 => vec![0x1b, b'[', b'2', b'3', b'~'],
                12 => vec![0x1b, b'[', b'2', b'4', b'~'],
                _ => vec![],
            }
        }
        _ => vec![],
    }
}

/// Control code for Ctrl+`c`: Ctrl+A = 0x01 through Ctrl+Z = 0x1a
fn control_byte(c: char) -> Option<u8> {
    match c {
        'a'..='z' | 'A'..='Z' => Some((c.to_ascii_lowercase() as u8) - b'a' + 1),
        ' ' | '@' | '2' => Some(0x00),
        '[' | '3' => Some(0x1b),
        '\\' | '4' => Some(0x1c),
        ']' | '5' => Some(0x1d),
        '^' | '6' => Some(0x1e),
        '_' | '-' | '7' => Some(0x1f),
        _ => None,
    }
}

fn utf8(c: char) -> Vec<u8> {
    let mut buf = [0u8; 4];
    c.encode_utf8(&mut buf).as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_unicode_chars() {
        assert_eq!(key_to_bytes(KeyCode::Char('a'), KeyModifiers::NONE), b"a");
        assert_eq!(key_to_bytes(KeyCode::Char('A'), KeyModifiers::SHIFT), b"A");
        assert_eq!(
            key_to_bytes(KeyCode::Char('é'), KeyModifiers::NONE),
            "é".as_bytes()
        );
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(key_to_bytes(KeyCode::Char('c'), KeyModifiers::CONTROL), vec![0x03]);
        assert_eq!(key_to_bytes(KeyCode::Char('D'), KeyModifiers::CONTROL), vec![0x04]);
        assert_eq!(key_to_bytes(KeyCode::Char(' '), KeyModifiers::CONTROL), vec![0x00]);
        assert_eq!(key_to_bytes(KeyCode::Char('['), KeyModifiers::CONTROL), vec![0x1b]);
    }

    #[test]
    fn test_alt_prefixes_escape() {
        assert_eq!(
            key_to_bytes(KeyCode::Char('b'), KeyModifiers::ALT),
            vec![0x1b, b'b']
        );
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(key_to_bytes(KeyCode::Enter, KeyModifiers::NONE), vec![b'\r']);
        assert_eq!(key_to_bytes(KeyCode::Up, KeyModifiers::NONE), b"\x1b[A");
        assert_eq!(key_to_bytes(KeyCode::BackTab, KeyModifiers::SHIFT), b"\x1b[Z");
        assert_eq!(key_to_bytes(KeyCode::F(5), KeyModifiers::NONE), b"\x1b[15~");
        assert!(key_to_bytes(KeyCode::F(20), KeyModifiers::NONE).is_empty());
    }
}

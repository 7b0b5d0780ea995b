//! Byte-level decoder for keyboard input, CSI arrow keys and X10 mouse
//! reports (`ESC [ M cb cx cy`, each value offset by 32).

use crate::action::Action;

const ESC: u8 = 0x1b;
const CTRL_C: u8 = 0x03;
const X10_OFFSET: u8 = 32;
const WHEEL_FLAG: u8 = 64;
const MODIFIER_BITS: u8 = 4 | 8 | 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Idle,
    ExpectBracket,
    ExpectCode,
    Mouse {
        buf: [u8; 3],
        filled: usize,
    },
}

#[derive(Debug, Default)]
pub struct Decoder {
    state: State,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns an action once a complete sequence is seen.
    /// Malformed or unknown sequences are dropped silently.
    pub fn feed(&mut self, byte: u8) -> Option<Action> {
        let (next, action) = match self.state {
            State::Idle => match byte {
                ESC => (State::ExpectBracket, None),
                other => (State::Idle, key_action(other)),
            },
            State::ExpectBracket => match byte {
                b'[' => (State::ExpectCode, None),
                _ => (State::Idle, None),
            },
            State::ExpectCode => match byte {
                b'A' => (State::Idle, Some(Action::ScrollUp)),
                b'B' => (State::Idle, Some(Action::ScrollDown)),
                b'M' => (
                    State::Mouse {
                        buf: [0; 3],
                        filled: 0,
                    },
                    None,
                ),
                _ => (State::Idle, None),
            },
            State::Mouse { mut buf, filled } => {
                buf[filled] = byte;
                if filled + 1 < buf.len() {
                    (
                        State::Mouse {
                            buf,
                            filled: filled + 1,
                        },
                        None,
                    )
                } else {
                    (State::Idle, MouseReport::decode(buf).action())
                }
            }
        };
        self.state = next;
        action
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }
}

/// Decode a whole buffer, collecting every completed action.
pub fn decode_all(bytes: &[u8]) -> Vec<Action> {
    let mut decoder = Decoder::new();
    bytes.iter().filter_map(|&b| decoder.feed(b)).collect()
}

fn key_action(byte: u8) -> Option<Action> {
    match byte {
        b'j' => Some(Action::ScrollDown),
        b'k' => Some(Action::ScrollUp),
        b'\r' => Some(Action::PageDown),
        b'1'..=b'9' => Some(Action::SortColumn(usize::from(byte - b'1'))),
        b'0' => Some(Action::SortColumn(9)),
        b'q' | CTRL_C => Some(Action::Quit),
        _ => None,
    }
}

/// One X10 mouse report with the +32 offset removed. Coordinates are
/// 1-based as the terminal reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseReport {
    pub button: u8,
    pub column: u8,
    pub row: u8,
}

impl MouseReport {
    pub fn decode(raw: [u8; 3]) -> Self {
        MouseReport {
            button: raw[0].wrapping_sub(X10_OFFSET),
            column: raw[1].wrapping_sub(X10_OFFSET),
            row: raw[2].wrapping_sub(X10_OFFSET),
        }
    }

    pub fn encode(&self) -> [u8; 6] {
        [
            ESC,
            b'[',
            b'M',
            self.button.wrapping_add(X10_OFFSET),
            self.column.wrapping_add(X10_OFFSET),
            self.row.wrapping_add(X10_OFFSET),
        ]
    }

    pub fn action(&self) -> Option<Action> {
        if self.button == 0 {
            return match (self.row, self.column) {
                (1, column) if column >= 1 => Some(Action::HeaderClick(usize::from(column - 1))),
                _ => None,
            };
        }
        let plain = self.button & !MODIFIER_BITS;
        match plain {
            b if b == WHEEL_FLAG => Some(Action::ScrollUp),
            b if b == WHEEL_FLAG | 1 => Some(Action::ScrollDown),
            _ => None,
        }
    }
}

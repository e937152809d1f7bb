//! # Keyboard Module
//!
//! Keyboard commands for the operator.
//!
//! This module handles:
//! - Keyboard detection and reading via evdev
//! - Decoding key codes to ASCII
//! - Dispatching keys to control state changes and pen selection

pub mod device;
pub mod dispatcher;

use evdev::Key;

/// Key transition reported by the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    Up,
    Down,
    /// Auto-repeat while held
    Repeat,
}

impl KeyState {
    /// Maps an evdev key event value (0, 1, 2) to a state.
    #[must_use]
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Up),
            1 => Some(KeyState::Down),
            2 => Some(KeyState::Repeat),
            _ => None,
        }
    }
}

/// A single key change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub state: KeyState,
}

impl KeyEvent {
    #[must_use]
    pub fn new(key: Key, state: KeyState) -> Self {
        Self { key, state }
    }
}

/// Decodes a key to the character it types.
///
/// Covers letters, the digit row, the keypad (digits only with `numlock`),
/// space and the common US-layout punctuation. With `ctrl`, letters map to
/// their control codes. Returns `None` for keys without a character.
///
/// # Examples
///
/// ```
/// use evdev::Key;
/// use joyplot::keyboard::to_ascii;
///
/// assert_eq!(to_ascii(Key::KEY_3, false, false, true), Some('3'));
/// assert_eq!(to_ascii(Key::KEY_3, true, false, true), Some('#'));
/// assert_eq!(to_ascii(Key::KEY_KP7, false, false, true), Some('7'));
/// assert_eq!(to_ascii(Key::KEY_KP7, false, false, false), None);
/// assert_eq!(to_ascii(Key::KEY_A, true, false, false), Some('A'));
/// ```
#[must_use]
pub fn to_ascii(key: Key, shift: bool, ctrl: bool, numlock: bool) -> Option<char> {
    if let Some(letter) = letter(key) {
        return Some(if ctrl {
            (letter as u8 - b'a' + 1) as char
        } else if shift {
            letter.to_ascii_uppercase()
        } else {
            letter
        });
    }

    if let Some(digit) = keypad_digit(key) {
        return numlock.then_some(digit);
    }

    let (plain, shifted) = match key {
        Key::KEY_1 => ('1', '!'),
        Key::KEY_2 => ('2', '@'),
        Key::KEY_3 => ('3', '#'),
        Key::KEY_4 => ('4', '$'),
        Key::KEY_5 => ('5', '%'),
        Key::KEY_6 => ('6', '^'),
        Key::KEY_7 => ('7', '&'),
        Key::KEY_8 => ('8', '*'),
        Key::KEY_9 => ('9', '('),
        Key::KEY_0 => ('0', ')'),
        Key::KEY_MINUS => ('-', '_'),
        Key::KEY_EQUAL => ('=', '+'),
        Key::KEY_LEFTBRACE => ('[', '{'),
        Key::KEY_RIGHTBRACE => (']', '}'),
        Key::KEY_SEMICOLON => (';', ':'),
        Key::KEY_APOSTROPHE => ('\'', '"'),
        Key::KEY_GRAVE => ('`', '~'),
        Key::KEY_BACKSLASH => ('\\', '|'),
        Key::KEY_COMMA => (',', '<'),
        Key::KEY_DOT => ('.', '>'),
        Key::KEY_SLASH => ('/', '?'),
        Key::KEY_SPACE => (' ', ' '),
        Key::KEY_TAB => ('\t', '\t'),
        Key::KEY_ENTER | Key::KEY_KPENTER => ('\n', '\n'),
        Key::KEY_KPSLASH => ('/', '/'),
        Key::KEY_KPASTERISK => ('*', '*'),
        Key::KEY_KPMINUS => ('-', '-'),
        Key::KEY_KPPLUS => ('+', '+'),
        _ => return None,
    };
    Some(if shift { shifted } else { plain })
}

fn letter(key: Key) -> Option<char> {
    let c = match key {
        Key::KEY_A => 'a',
        Key::KEY_B => 'b',
        Key::KEY_C => 'c',
        Key::KEY_D => 'd',
        Key::KEY_E => 'e',
        Key::KEY_F => 'f',
        Key::KEY_G => 'g',
        Key::KEY_H => 'h',
        Key::KEY_I => 'i',
        Key::KEY_J => 'j',
        Key::KEY_K => 'k',
        Key::KEY_L => 'l',
        Key::KEY_M => 'm',
        Key::KEY_N => 'n',
        Key::KEY_O => 'o',
        Key::KEY_P => 'p',
        Key::KEY_Q => 'q',
        Key::KEY_R => 'r',
        Key::KEY_S => 's',
        Key::KEY_T => 't',
        Key::KEY_U => 'u',
        Key::KEY_V => 'v',
        Key::KEY_W => 'w',
        Key::KEY_X => 'x',
        Key::KEY_Y => 'y',
        Key::KEY_Z => 'z',
        _ => return None,
    };
    Some(c)
}

fn keypad_digit(key: Key) -> Option<char> {
    let c = match key {
        Key::KEY_KP0 => '0',
        Key::KEY_KP1 => '1',
        Key::KEY_KP2 => '2',
        Key::KEY_KP3 => '3',
        Key::KEY_KP4 => '4',
        Key::KEY_KP5 => '5',
        Key::KEY_KP6 => '6',
        Key::KEY_KP7 => '7',
        Key::KEY_KP8 => '8',
        Key::KEY_KP9 => '9',
        Key::KEY_KPDOT => '.',
        _ => return None,
    };
    Some(c)
}

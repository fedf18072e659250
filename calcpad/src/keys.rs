//! Logical key symbols and their mapping to evdev key codes.

use evdev::Key;

/// A logical key, independent of the matrix position and mode it was
/// resolved under.
///
/// Printable keys carry the character they should produce; everything
/// else is a named key. Whether a shift wrap is needed is derived from
/// the symbol, not from the injected key code, since `!` and `1` share
/// a code but not a modifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeySym {
    Char(char),
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Escape,
    Delete,
    BackSpace,
    Insert,
    Tab,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    NumLock,
    ScrollLock,
    PrintScreen,
    Pause,
    KpMultiply,
    KpSubtract,
    KpAdd,
    KpEnter,
}

/// Printable characters that sit on the shifted layer of a US keyboard.
/// Uppercase letters are handled separately.
const SHIFT_CHARS: &str = "~!@#$%^&*()_+{}|:\"<>?";

pub const SHIFT_KEY: Key = Key::KEY_LEFTSHIFT;
pub const CTRL_KEY: Key = Key::KEY_LEFTCTRL;

impl KeySym {
    /// Whether injecting this symbol requires wrapping it in a shift
    /// press/release pair.
    pub fn shift_required(self) -> bool {
        match self {
            KeySym::Char(c) => c.is_ascii_uppercase() || SHIFT_CHARS.contains(c),
            _ => false,
        }
    }

    /// Resolves the symbol to the evdev key code to inject.
    ///
    /// Returns `None` for characters with no key on a US layout.
    pub fn key_code(self) -> Option<Key> {
        let key = match self {
            KeySym::Char(c) => return char_code(c),
            KeySym::F1 => Key::KEY_F1,
            KeySym::F2 => Key::KEY_F2,
            KeySym::F3 => Key::KEY_F3,
            KeySym::F4 => Key::KEY_F4,
            KeySym::F5 => Key::KEY_F5,
            KeySym::F6 => Key::KEY_F6,
            KeySym::F7 => Key::KEY_F7,
            KeySym::F8 => Key::KEY_F8,
            KeySym::F9 => Key::KEY_F9,
            KeySym::F10 => Key::KEY_F10,
            KeySym::F11 => Key::KEY_F11,
            KeySym::F12 => Key::KEY_F12,
            KeySym::Escape => Key::KEY_ESC,
            KeySym::Delete => Key::KEY_DELETE,
            KeySym::BackSpace => Key::KEY_BACKSPACE,
            KeySym::Insert => Key::KEY_INSERT,
            KeySym::Tab => Key::KEY_TAB,
            KeySym::Up => Key::KEY_UP,
            KeySym::Down => Key::KEY_DOWN,
            KeySym::Left => Key::KEY_LEFT,
            KeySym::Right => Key::KEY_RIGHT,
            KeySym::PageUp => Key::KEY_PAGEUP,
            KeySym::PageDown => Key::KEY_PAGEDOWN,
            KeySym::Home => Key::KEY_HOME,
            KeySym::End => Key::KEY_END,
            KeySym::NumLock => Key::KEY_NUMLOCK,
            KeySym::ScrollLock => Key::KEY_SCROLLLOCK,
            KeySym::PrintScreen => Key::KEY_SYSRQ,
            KeySym::Pause => Key::KEY_PAUSE,
            KeySym::KpMultiply => Key::KEY_KPASTERISK,
            KeySym::KpSubtract => Key::KEY_KPMINUS,
            KeySym::KpAdd => Key::KEY_KPPLUS,
            KeySym::KpEnter => Key::KEY_KPENTER,
        };
        Some(key)
    }
}

fn char_code(c: char) -> Option<Key> {
    let key = match c.to_ascii_lowercase() {
        'a' => Key::KEY_A,
        'b' => Key::KEY_B,
        'c' => Key::KEY_C,
        'd' => Key::KEY_D,
        'e' => Key::KEY_E,
        'f' => Key::KEY_F,
        'g' => Key::KEY_G,
        'h' => Key::KEY_H,
        'i' => Key::KEY_I,
        'j' => Key::KEY_J,
        'k' => Key::KEY_K,
        'l' => Key::KEY_L,
        'm' => Key::KEY_M,
        'n' => Key::KEY_N,
        'o' => Key::KEY_O,
        'p' => Key::KEY_P,
        'q' => Key::KEY_Q,
        'r' => Key::KEY_R,
        's' => Key::KEY_S,
        't' => Key::KEY_T,
        'u' => Key::KEY_U,
        'v' => Key::KEY_V,
        'w' => Key::KEY_W,
        'x' => Key::KEY_X,
        'y' => Key::KEY_Y,
        'z' => Key::KEY_Z,
        '1' | '!' => Key::KEY_1,
        '2' | '@' => Key::KEY_2,
        '3' | '#' => Key::KEY_3,
        '4' | '$' => Key::KEY_4,
        '5' | '%' => Key::KEY_5,
        '6' | '^' => Key::KEY_6,
        '7' | '&' => Key::KEY_7,
        '8' | '*' => Key::KEY_8,
        '9' | '(' => Key::KEY_9,
        '0' | ')' => Key::KEY_0,
        '-' | '_' => Key::KEY_MINUS,
        '=' | '+' => Key::KEY_EQUAL,
        '[' | '{' => Key::KEY_LEFTBRACE,
        ']' | '}' => Key::KEY_RIGHTBRACE,
        '\\' | '|' => Key::KEY_BACKSLASH,
        ';' | ':' => Key::KEY_SEMICOLON,
        '\'' | '"' => Key::KEY_APOSTROPHE,
        ',' | '<' => Key::KEY_COMMA,
        '.' | '>' => Key::KEY_DOT,
        '/' | '?' => Key::KEY_SLASH,
        '`' | '~' => Key::KEY_GRAVE,
        ' ' => Key::KEY_SPACE,
        _ => return None,
    };
    Some(key)
}

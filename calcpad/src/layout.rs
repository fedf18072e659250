//! Static layout tables mapping a matrix position to a logical symbol,
//! one table per input mode.
//!
//! The legends follow the TI-83 keypad: row 0 is the Mode/Math/Apps row,
//! row 7 the Graph/0/./Enter row. Positions with no key wired (or no
//! sensible mapping in a mode) hold the `None` sentinel.

use crate::keys::KeySym;
use crate::mode::Mode;

pub const ROWS: usize = 8;
pub const COLS: usize = 7;

/// A mode-control command resolved from a reserved key position.
/// Never forwarded to the key emulator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    EnterAlphaUpper,
    EnterAlphaLower,
    EnterSecond,
    EnterNormal,
    ToggleAlphaLock,
    ToggleControlLock,
    BrightnessUp,
    BrightnessDown,
}

/// What a matrix position resolves to under a given mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Symbol {
    /// No key at this position.
    None,
    /// An ordinary key, forwarded to the emulator.
    Key(KeySym),
    /// A reserved mode-control command, consumed by the dispatcher.
    Command(Command),
}

pub type Layout = [[Symbol; COLS]; ROWS];

/// The symbol that, combined with the held power key, cycles between the
/// base modes. It sits at the Mode key position (row 0, col 0) of every
/// table.
pub const MODE_SHORTCUT: Symbol = Symbol::Key(KeySym::F11);

/// Emitted while the power key is held in Calculator mode with no matrix
/// key down.
pub const SECONDARY_FUNCTION: Symbol = Symbol::Key(KeySym::F12);

const fn ch(c: char) -> Symbol {
    Symbol::Key(KeySym::Char(c))
}

const fn key(k: KeySym) -> Symbol {
    Symbol::Key(k)
}

const fn cmd(c: Command) -> Symbol {
    Symbol::Command(c)
}

const NONE: Symbol = Symbol::None;

use Command::*;
use KeySym::{
    BackSpace, Delete, Down, End, Escape, Home, Insert, KpAdd, KpEnter, KpMultiply, KpSubtract,
    Left, NumLock, PageDown, PageUp, Pause, PrintScreen, Right, ScrollLock, Tab, Up, F1, F2, F3,
    F4, F5, F6, F7, F8, F9, F10, F11, F12,
};

#[rustfmt::skip]
static NORMAL: Layout = [
    // Mode, Math, Apps, Prgm, Vars, Clear
    [key(F11), ch('`'), ch('!'), ch('@'), ch('#'), key(Escape), NONE],
    // Del, Alpha, GraphVar, Stat
    [key(Delete), cmd(EnterAlphaLower), ch('\''), ch(';'), NONE, NONE, NONE],
    // 2nd, X^-1, Sin, Cos, Tan, ^
    [cmd(EnterSecond), ch('<'), ch('>'), ch('$'), ch('%'), ch('^'), NONE],
    // Y=, X^2, ',', (, ), Divide
    [key(F1), ch('/'), ch(','), ch('('), ch(')'), ch('/'), NONE],
    // Window, Log, 7, 8, 9, Multiply, Up
    [key(F2), ch('\\'), ch('7'), ch('8'), ch('9'), key(KpMultiply), key(Up)],
    // Zoom, LN, 4, 5, 6, Subtract, Right
    [key(F3), key(Tab), ch('4'), ch('5'), ch('6'), key(KpSubtract), key(Right)],
    // Trace, Sto->, 1, 2, 3, Add, Left
    [key(F4), ch('='), ch('1'), ch('2'), ch('3'), key(KpAdd), key(Left)],
    // Graph, -, 0, ., Negate, Enter, Down
    [key(F5), NONE, ch('0'), ch('.'), key(KpSubtract), key(KpEnter), key(Down)],
];

#[rustfmt::skip]
static ALPHA_UPPER: Layout = [
    [key(F11), ch('A'), ch('B'), ch('C'), NONE, key(Escape), NONE],
    [key(BackSpace), cmd(EnterAlphaLower), NONE, NONE, NONE, NONE, NONE],
    [cmd(EnterSecond), ch('D'), ch('E'), ch('F'), ch('G'), ch('H'), NONE],
    [key(F1), ch('I'), ch('J'), ch('K'), ch('L'), ch('M'), NONE],
    [key(F2), ch('N'), ch('O'), ch('P'), ch('Q'), ch('R'), key(PageUp)],
    [key(F3), ch('S'), ch('T'), ch('U'), ch('V'), ch('W'), key(Right)],
    [key(F4), ch('X'), ch('Y'), ch('Z'), NONE, ch('"'), key(Left)],
    [key(F5), NONE, ch(' '), ch(':'), ch('?'), key(KpEnter), key(PageDown)],
];

#[rustfmt::skip]
static ALPHA_LOWER: Layout = [
    [key(F11), ch('a'), ch('b'), ch('c'), NONE, key(Escape), NONE],
    [key(BackSpace), cmd(EnterAlphaUpper), NONE, NONE, NONE, NONE, NONE],
    [cmd(EnterSecond), ch('d'), ch('e'), ch('f'), ch('g'), ch('h'), NONE],
    [key(F1), ch('i'), ch('j'), ch('k'), ch('l'), ch('m'), NONE],
    [key(F2), ch('n'), ch('o'), ch('p'), ch('q'), ch('r'), key(PageUp)],
    [key(F3), ch('s'), ch('t'), ch('u'), ch('v'), ch('w'), key(Right)],
    [key(F4), ch('x'), ch('y'), ch('z'), NONE, ch('"'), key(Left)],
    [key(F5), NONE, ch(' '), ch(':'), ch('?'), key(KpEnter), key(PageDown)],
];

#[rustfmt::skip]
static SECOND: Layout = [
    [key(F11), ch('~'), NONE, NONE, NONE, key(Escape), NONE],
    [key(Insert), cmd(ToggleAlphaLock), key(F12), cmd(ToggleControlLock), NONE, NONE, NONE],
    [cmd(EnterNormal), NONE, NONE, NONE, NONE, ch('&'), NONE],
    [key(F6), NONE, NONE, ch('{'), ch('}'), ch('e'), NONE],
    [key(F7), ch('|'), ch('u'), ch('v'), ch('w'), ch('['), cmd(BrightnessUp)],
    [key(F8), NONE, key(NumLock), NONE, NONE, ch(']'), key(End)],
    [key(F9), NONE, key(PrintScreen), key(ScrollLock), key(Pause), NONE, key(Home)],
    [key(F10), NONE, NONE, ch('i'), ch('_'), key(KpEnter), cmd(BrightnessDown)],
];

#[rustfmt::skip]
static CALCULATOR: Layout = [
    [key(F11), key(F6), key(F7), key(F8), key(F9), key(Escape), NONE],
    [key(Delete), ch('\''), ch('x'), key(F10), NONE, NONE, NONE],
    [key(Tab), ch('\\'), ch('s'), ch('c'), ch('t'), ch('^'), NONE],
    [key(F1), ch(';'), ch(','), ch('('), ch(')'), ch('/'), NONE],
    [key(F2), ch('o'), ch('7'), ch('8'), ch('9'), key(KpMultiply), key(Up)],
    [key(F3), ch('l'), ch('4'), ch('5'), ch('6'), key(KpSubtract), key(Right)],
    [key(F4), ch('='), ch('1'), ch('2'), ch('3'), key(KpAdd), key(Left)],
    [key(F5), NONE, ch('0'), ch('.'), ch('~'), key(KpEnter), key(Down)],
];

fn table(mode: Mode) -> &'static Layout {
    match mode {
        Mode::Normal => &NORMAL,
        Mode::AlphaUpper => &ALPHA_UPPER,
        Mode::AlphaLower => &ALPHA_LOWER,
        Mode::Second => &SECOND,
        Mode::Calculator => &CALCULATOR,
    }
}

/// Resolves a matrix position under the given mode. Out-of-range
/// positions resolve to the `None` sentinel.
pub fn resolve(mode: Mode, row: usize, col: usize) -> Symbol {
    if row >= ROWS || col >= COLS {
        return Symbol::None;
    }
    table(mode)[row][col]
}

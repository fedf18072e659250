//! Classification of resolved symbols and execution of mode-control
//! commands.
//!
//! Commands fire on key release, matching the physical button feel and
//! avoiding double-firing while a key is held. The brightness pair can
//! be switched to press-time firing through configuration.

use crate::backlight::Backlight;
use crate::layout::{Command, Symbol};
use crate::mode::{Mode, ModeController};
use calcpad_gpio::GpioResult;
use log::warn;

/// What the scanner should do with a resolved symbol.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Action {
    /// Dead position; latch and wait for release, emit nothing.
    Ignore,
    /// Forward to the key emulator.
    Passthrough,
    /// Consume as a mode-control command.
    Command(Command),
}

pub fn classify(symbol: Symbol) -> Action {
    match symbol {
        Symbol::None => Action::Ignore,
        Symbol::Key(_) => Action::Passthrough,
        Symbol::Command(cmd) => Action::Command(cmd),
    }
}

/// Whether a command acts at press time under the given policy. Only the
/// brightness pair is affected; mode and lock commands always fire on
/// release.
pub fn fires_on_press(cmd: Command, brightness_on_press: bool) -> bool {
    brightness_on_press && matches!(cmd, Command::BrightnessUp | Command::BrightnessDown)
}

/// Executes a command against the mode controller and backlight.
pub fn dispatch(
    cmd: Command,
    modes: &mut ModeController<'_>,
    backlight: &mut dyn Backlight,
) -> GpioResult<()> {
    match cmd {
        Command::EnterAlphaUpper => modes.change_mode(Mode::AlphaUpper),
        Command::EnterAlphaLower => modes.change_mode(Mode::AlphaLower),
        Command::EnterSecond => modes.change_mode(Mode::Second),
        Command::EnterNormal => modes.change_mode(Mode::Normal),
        Command::ToggleAlphaLock => modes.toggle_alpha_lock(),
        Command::ToggleControlLock => modes.toggle_control_lock(),
        Command::BrightnessUp => {
            if let Err(e) = backlight.step_up() {
                // Brightness is best-effort once running.
                warn!("Backlight step up failed: {}", e);
            }
        }
        Command::BrightnessDown => {
            if let Err(e) = backlight.step_down() {
                warn!("Backlight step down failed: {}", e);
            }
        }
    }
    Ok(())
}

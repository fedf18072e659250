//! The matrix scan loop.
//!
//! One [Scanner::tick] runs per scheduler period. Waiting for a held key
//! is an explicit state (`KeyHeld`/`PowerHeld`) re-entered on every tick
//! instead of a busy-wait, so a held key never stalls the caller. Hold
//! and release edges are still observed each tick.

use crate::backlight::Backlight;
use crate::dispatch::{self, Action, classify, fires_on_press};
use crate::emulator::KeyEmulator;
use crate::layout::{self, MODE_SHORTCUT, SECONDARY_FUNCTION, Symbol};
use crate::mode::{Mode, ModeController};
use crate::power::PowerControl;
use calcpad_gpio::keypad::KeypadMatrix;
use calcpad_gpio::{GpioError, GpioInput};
use log::{info, trace};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
    #[error("key injection error: {0}")]
    Inject(#[from] std::io::Error),
}

/// Where the scanner is between ticks. At most one key is ever tracked;
/// the `KeyHeld`/`PowerHeld` states double as the "key pressed" guard
/// that keeps a held key from being scanned again.
#[derive(Copy, Clone, Debug)]
enum ScanState {
    Idle,
    /// A matrix key is latched; waiting for its column to go inactive.
    KeyHeld {
        row: usize,
        col: usize,
        symbol: Symbol,
        ctrl: bool,
    },
    /// The power key is held with no matrix key; a stand-in symbol is
    /// pressed while the mode-shortcut position is watched.
    PowerHeld { symbol: Symbol, ctrl: bool },
    /// Shutdown has been requested; swallow everything until the power
    /// key is released.
    PowerOffWait,
    /// Post-release bounce window.
    Debounce { until: Instant },
}

pub struct Scanner<'a> {
    matrix: &'a dyn KeypadMatrix,
    /// Dedicated power button. The pin is configured active-low, so
    /// `read() == true` means pressed.
    power_key: &'a dyn GpioInput,
    modes: ModeController<'a>,
    emulator: KeyEmulator<'a>,
    backlight: &'a mut dyn Backlight,
    power: &'a mut dyn PowerControl,
    bounce_delay: Duration,
    brightness_on_press: bool,
    state: ScanState,
}

impl<'a> Scanner<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        matrix: &'a dyn KeypadMatrix,
        power_key: &'a dyn GpioInput,
        modes: ModeController<'a>,
        emulator: KeyEmulator<'a>,
        backlight: &'a mut dyn Backlight,
        power: &'a mut dyn PowerControl,
        bounce_delay: Duration,
        brightness_on_press: bool,
    ) -> Self {
        Scanner {
            matrix,
            power_key,
            modes,
            emulator,
            backlight,
            power,
            bounce_delay,
            brightness_on_press,
            state: ScanState::Idle,
        }
    }

    pub fn mode(&self) -> Mode {
        self.modes.current()
    }

    /// Runs one scan tick. Returns `true` while the loop should keep
    /// being scheduled; `false` once a shutdown gesture has completed.
    pub fn tick(&mut self) -> Result<bool, DriverError> {
        match self.state {
            ScanState::Debounce { until } => {
                if Instant::now() >= until {
                    self.state = ScanState::Idle;
                }
                Ok(true)
            }
            ScanState::KeyHeld {
                row,
                col,
                symbol,
                ctrl,
            } => self.tick_key_held(row, col, symbol, ctrl),
            ScanState::PowerHeld { symbol, ctrl } => self.tick_power_held(symbol, ctrl),
            ScanState::PowerOffWait => {
                if self.power_key.read()? {
                    Ok(true)
                } else {
                    info!("Power key released; stopping scan loop");
                    Ok(false)
                }
            }
            ScanState::Idle => self.tick_scan(),
        }
    }

    /// Full matrix pass: first active (row, col) wins and latches; with
    /// no matrix hit, the dedicated power key is checked.
    fn tick_scan(&mut self) -> Result<bool, DriverError> {
        for row in 0..self.matrix.row_count() {
            self.matrix.select_row(row)?;
            for col in 0..self.matrix.col_count() {
                if self.matrix.read_column(col)? {
                    let symbol = layout::resolve(self.modes.current(), row, col);
                    trace!("Key at ({}, {}) resolved to {:?}", row, col, symbol);
                    let ctrl = self.handle_press(symbol)?;
                    self.state = ScanState::KeyHeld {
                        row,
                        col,
                        symbol,
                        ctrl,
                    };
                    return Ok(true);
                }
            }
        }

        if self.power_key.read()? {
            match self.modes.current() {
                Mode::Second => {
                    // Deliberate power-off gesture.
                    self.power.shutdown()?;
                    self.state = ScanState::PowerOffWait;
                }
                mode => {
                    let symbol = if mode == Mode::Calculator {
                        SECONDARY_FUNCTION
                    } else {
                        Symbol::None
                    };
                    let ctrl = self.modes.control_lock_armed();
                    self.emulator.press(symbol, ctrl)?;
                    self.state = ScanState::PowerHeld { symbol, ctrl };
                }
            }
        }

        Ok(true)
    }

    fn tick_key_held(
        &mut self,
        row: usize,
        col: usize,
        symbol: Symbol,
        ctrl: bool,
    ) -> Result<bool, DriverError> {
        self.matrix.select_row(row)?;
        if self.matrix.read_column(col)? {
            if symbol == MODE_SHORTCUT && self.power_key.read()? {
                info!("Mode change key combo detected");
                self.modes.cycle_base_mode();
                self.finish_key(symbol, ctrl)?;
            }
            return Ok(true);
        }

        self.finish_key(symbol, ctrl)?;
        Ok(true)
    }

    fn tick_power_held(&mut self, symbol: Symbol, ctrl: bool) -> Result<bool, DriverError> {
        if self.power_key.read()? {
            // Watch the mode-shortcut position while the key is down.
            self.matrix.select_row(0)?;
            if self.matrix.read_column(0)? {
                info!("Mode change key combo detected");
                self.modes.cycle_base_mode();
                self.release_emulated(symbol, ctrl)?;
            }
            return Ok(true);
        }

        self.release_emulated(symbol, ctrl)?;
        Ok(true)
    }

    /// Press-side handling. Returns whether the control modifier was
    /// latched for this key, so the release can tear it down.
    fn handle_press(&mut self, symbol: Symbol) -> Result<bool, DriverError> {
        match classify(symbol) {
            Action::Command(cmd) => {
                if fires_on_press(cmd, self.brightness_on_press) {
                    dispatch::dispatch(cmd, &mut self.modes, self.backlight)?;
                }
                Ok(false)
            }
            Action::Passthrough => {
                // Latch the lock before the transient collapse can clear it.
                let ctrl = self.modes.control_lock_armed();
                self.modes.return_from_transient();
                self.emulator.press(symbol, ctrl)?;
                Ok(ctrl)
            }
            Action::Ignore => Ok(false),
        }
    }

    fn handle_release(&mut self, symbol: Symbol, ctrl: bool) -> Result<(), DriverError> {
        match classify(symbol) {
            Action::Command(cmd) => {
                if !fires_on_press(cmd, self.brightness_on_press) {
                    dispatch::dispatch(cmd, &mut self.modes, self.backlight)?;
                }
            }
            Action::Passthrough => {
                self.emulator.release(symbol, ctrl)?;
                self.modes.consume_control_lock();
            }
            Action::Ignore => {}
        }
        Ok(())
    }

    fn release_emulated(&mut self, symbol: Symbol, ctrl: bool) -> Result<(), DriverError> {
        self.emulator.release(symbol, ctrl)?;
        // The lock is single-shot per amplified keystroke; the sentinel
        // placeholder injects nothing, so it must not use the lock up.
        if symbol != Symbol::None {
            self.modes.consume_control_lock();
        }
        self.begin_debounce();
        Ok(())
    }

    fn finish_key(&mut self, symbol: Symbol, ctrl: bool) -> Result<(), DriverError> {
        self.handle_release(symbol, ctrl)?;
        self.begin_debounce();
        Ok(())
    }

    fn begin_debounce(&mut self) {
        self.state = ScanState::Debounce {
            until: Instant::now() + self.bounce_delay,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backlight::tests::FakeBacklight;
    use crate::indicator::tests::NullIndicator;
    use crate::inject::tests::RecordingInjector;
    use crate::keys::{CTRL_KEY, KeySym};
    use calcpad_gpio::GpioResult;
    use evdev::Key;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;

    #[derive(Debug, Default)]
    struct FakeMatrix {
        selected: Cell<usize>,
        pressed: RefCell<HashSet<(usize, usize)>>,
    }

    impl FakeMatrix {
        fn press(&self, row: usize, col: usize) {
            self.pressed.borrow_mut().insert((row, col));
        }

        fn release(&self, row: usize, col: usize) {
            self.pressed.borrow_mut().remove(&(row, col));
        }
    }

    impl KeypadMatrix for FakeMatrix {
        fn row_count(&self) -> usize {
            layout::ROWS
        }

        fn col_count(&self) -> usize {
            layout::COLS
        }

        fn select_row(&self, row: usize) -> GpioResult<()> {
            self.selected.set(row);
            Ok(())
        }

        fn read_column(&self, col: usize) -> GpioResult<bool> {
            Ok(self.pressed.borrow().contains(&(self.selected.get(), col)))
        }
    }

    #[derive(Debug, Default)]
    struct FakeButton {
        down: Cell<bool>,
    }

    impl GpioInput for FakeButton {
        fn read(&self) -> GpioResult<bool> {
            Ok(self.down.get())
        }
    }

    #[derive(Debug, Default)]
    struct CountingPower {
        shutdowns: usize,
    }

    impl PowerControl for CountingPower {
        fn shutdown(&mut self) -> std::io::Result<()> {
            self.shutdowns += 1;
            Ok(())
        }
    }

    /// Mutably-borrowed collaborators. The matrix and power button live
    /// outside so tests can poke them while the scanner holds shared
    /// borrows.
    struct Rig {
        indicator: NullIndicator,
        injector: RecordingInjector,
        backlight: FakeBacklight,
        power: CountingPower,
    }

    impl Rig {
        fn new() -> Self {
            Rig {
                indicator: NullIndicator::default(),
                injector: RecordingInjector::default(),
                backlight: FakeBacklight { level: 5 },
                power: CountingPower::default(),
            }
        }

        fn scanner<'a>(
            &'a mut self,
            matrix: &'a FakeMatrix,
            button: &'a FakeButton,
            setup: impl FnOnce(&mut ModeController<'a>),
        ) -> Scanner<'a> {
            self.scanner_with(matrix, button, Duration::ZERO, false, setup)
        }

        fn scanner_with<'a>(
            &'a mut self,
            matrix: &'a FakeMatrix,
            button: &'a FakeButton,
            bounce_delay: Duration,
            brightness_on_press: bool,
            setup: impl FnOnce(&mut ModeController<'a>),
        ) -> Scanner<'a> {
            let mut modes = ModeController::new(Mode::Normal, &mut self.indicator);
            setup(&mut modes);
            Scanner::new(
                matrix,
                button,
                modes,
                KeyEmulator::new(&mut self.injector),
                &mut self.backlight,
                &mut self.power,
                bounce_delay,
                brightness_on_press,
            )
        }
    }

    /// Ticks through the zero-length debounce window.
    fn settle(scanner: &mut Scanner<'_>) {
        scanner.tick().unwrap();
        scanner.tick().unwrap();
    }

    #[test]
    fn press_hold_release_emits_one_pair() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        matrix.press(4, 2); // '7' in Normal mode
        {
            let mut scanner = rig.scanner(&matrix, &button, |_| {});
            scanner.tick().unwrap(); // latch + press
            scanner.tick().unwrap(); // still held: no-op
            scanner.tick().unwrap();
            matrix.release(4, 2);
            scanner.tick().unwrap(); // release edge
        }
        assert_eq!(
            rig.injector.events,
            vec![(Key::KEY_7, true), (Key::KEY_7, false)]
        );
    }

    #[test]
    fn first_found_wins_within_a_pass() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        matrix.press(4, 2); // '7'
        matrix.press(6, 3); // '2', later in row-major order
        {
            let mut scanner = rig.scanner(&matrix, &button, |_| {});
            scanner.tick().unwrap();
        }
        assert_eq!(rig.injector.events, vec![(Key::KEY_7, true)]);
    }

    #[test]
    fn held_key_suppresses_further_scanning() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        matrix.press(4, 2);
        {
            let mut scanner = rig.scanner(&matrix, &button, |_| {});
            scanner.tick().unwrap();
            matrix.press(6, 3);
            scanner.tick().unwrap();
            scanner.tick().unwrap();
        }
        assert_eq!(rig.injector.events, vec![(Key::KEY_7, true)]);
    }

    #[test]
    fn debounce_window_absorbs_immediate_repress() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        matrix.press(4, 2);
        {
            let mut scanner =
                rig.scanner_with(&matrix, &button, Duration::from_secs(3600), false, |_| {});
            scanner.tick().unwrap();
            matrix.release(4, 2);
            scanner.tick().unwrap(); // release, debounce starts
            matrix.press(4, 2); // bouncing contact
            scanner.tick().unwrap();
            scanner.tick().unwrap();
        }
        assert_eq!(
            rig.injector.events,
            vec![(Key::KEY_7, true), (Key::KEY_7, false)]
        );
    }

    #[test]
    fn alpha_command_switches_case_on_release() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner =
                rig.scanner(&matrix, &button, |modes| modes.change_mode(Mode::AlphaUpper));
            matrix.press(1, 1); // Alpha key
            scanner.tick().unwrap();
            assert_eq!(scanner.mode(), Mode::AlphaUpper); // not fired on press
            matrix.release(1, 1);
            scanner.tick().unwrap();
            assert_eq!(scanner.mode(), Mode::AlphaLower);
            let state = scanner.modes.state();
            assert!(!state.alpha_lock);
            assert!(!state.control_lock);
        }
        // The command never reached the emulator.
        assert!(rig.injector.events.is_empty());
    }

    #[test]
    fn alpha_lock_from_second_restores_previous_alpha() {
        // Second entered from AlphaUpper; the lock key re-enters
        // AlphaUpper with the lock set.
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner = rig.scanner(&matrix, &button, |modes| {
                modes.change_mode(Mode::AlphaUpper);
                modes.change_mode(Mode::Second);
            });
            matrix.press(1, 1);
            scanner.tick().unwrap();
            matrix.release(1, 1);
            scanner.tick().unwrap();
            assert_eq!(scanner.mode(), Mode::AlphaUpper);
            assert!(scanner.modes.state().alpha_lock);
        }
    }

    #[test]
    fn locked_alpha_survives_ordinary_keys() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner = rig.scanner(&matrix, &button, |modes| {
                modes.change_mode(Mode::AlphaLower);
                modes.change_mode(Mode::Second);
                modes.toggle_alpha_lock();
            });
            assert_eq!(scanner.mode(), Mode::AlphaLower);
            matrix.press(2, 1); // 'd'
            scanner.tick().unwrap();
            matrix.release(2, 1);
            settle(&mut scanner);
            assert_eq!(scanner.mode(), Mode::AlphaLower);
        }
        assert_eq!(
            rig.injector.events,
            vec![(Key::KEY_D, true), (Key::KEY_D, false)]
        );
    }

    #[test]
    fn unlocked_alpha_collapses_before_the_key_is_emitted() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner =
                rig.scanner(&matrix, &button, |modes| modes.change_mode(Mode::AlphaLower));
            matrix.press(2, 1); // 'd' under AlphaLower
            scanner.tick().unwrap();
            // Resolved under the old mode, emitted after the collapse.
            assert_eq!(scanner.mode(), Mode::Normal);
        }
        assert_eq!(rig.injector.events, vec![(Key::KEY_D, true)]);
    }

    #[test]
    fn second_is_transient_relative_to_previous() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner = rig.scanner(&matrix, &button, |modes| {
                modes.change_mode(Mode::AlphaUpper);
                modes.change_mode(Mode::Second);
            });
            matrix.press(4, 2); // 'u' in Second
            scanner.tick().unwrap();
            assert_eq!(scanner.mode(), Mode::AlphaUpper);
            matrix.release(4, 2);
            settle(&mut scanner);
            assert_eq!(scanner.mode(), Mode::AlphaUpper);
        }
        assert_eq!(
            rig.injector.events,
            vec![(Key::KEY_U, true), (Key::KEY_U, false)]
        );
    }

    #[test]
    fn control_lock_is_single_shot() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner = rig.scanner(&matrix, &button, |modes| {
                modes.change_mode(Mode::Second);
                modes.toggle_control_lock();
            });
            matrix.press(4, 2); // 'u'
            scanner.tick().unwrap();
            matrix.release(4, 2);
            settle(&mut scanner);
            assert!(!scanner.modes.state().control_lock);

            // Next key gets no control modifier.
            matrix.press(4, 2); // '7' in Normal now
            scanner.tick().unwrap();
            matrix.release(4, 2);
            settle(&mut scanner);
        }
        let ctrl_events = rig
            .injector
            .events
            .iter()
            .filter(|(k, _)| *k == CTRL_KEY)
            .count();
        assert_eq!(ctrl_events, 2);
        assert_eq!(
            rig.injector.events[..4],
            [
                (CTRL_KEY, true),
                (Key::KEY_U, true),
                (Key::KEY_U, false),
                (CTRL_KEY, false),
            ]
        );
    }

    #[test]
    fn brightness_fires_on_release_by_default() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner =
                rig.scanner(&matrix, &button, |modes| modes.change_mode(Mode::Second));
            matrix.press(4, 6); // brightness up
            scanner.tick().unwrap();
            assert_eq!(scanner.backlight.level(), 5);
            matrix.release(4, 6);
            scanner.tick().unwrap();
            assert_eq!(scanner.backlight.level(), 6);
            // Still in Second: brightness is a command, not an ordinary key.
            assert_eq!(scanner.mode(), Mode::Second);
        }
    }

    #[test]
    fn brightness_on_press_policy_fires_once() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner = rig.scanner_with(&matrix, &button, Duration::ZERO, true, |modes| {
                modes.change_mode(Mode::Second)
            });
            matrix.press(7, 6); // brightness down
            scanner.tick().unwrap();
            assert_eq!(scanner.backlight.level(), 4);
            matrix.release(7, 6);
            scanner.tick().unwrap();
            assert_eq!(scanner.backlight.level(), 4);
        }
    }

    #[test]
    fn mode_shortcut_combo_cycles_base_mode() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner = rig.scanner(&matrix, &button, |_| {});
            matrix.press(0, 0); // Mode key
            scanner.tick().unwrap();
            assert_eq!(scanner.mode(), Mode::Normal);
            button.down.set(true);
            scanner.tick().unwrap();
            assert_eq!(scanner.mode(), Mode::Calculator);
        }
        // F11 pressed and released around the combo.
        assert_eq!(
            rig.injector.events,
            vec![(Key::KEY_F11, true), (Key::KEY_F11, false)]
        );
    }

    #[test]
    fn power_key_in_calculator_emits_secondary_function() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner =
                rig.scanner(&matrix, &button, |modes| modes.change_mode(Mode::Calculator));
            button.down.set(true);
            scanner.tick().unwrap();
            assert_eq!(scanner.mode(), Mode::Calculator);

            matrix.press(0, 0); // shortcut column goes active
            scanner.tick().unwrap();
            assert_eq!(scanner.mode(), Mode::Normal);
        }
        assert_eq!(
            rig.injector.events,
            vec![(Key::KEY_F12, true), (Key::KEY_F12, false)]
        );
    }

    #[test]
    fn power_key_outside_calculator_emits_nothing() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner = rig.scanner(&matrix, &button, |_| {});
            button.down.set(true);
            scanner.tick().unwrap();
            scanner.tick().unwrap();
            button.down.set(false);
            scanner.tick().unwrap();
        }
        assert!(rig.injector.events.is_empty());
        assert_eq!(rig.power.shutdowns, 0);
    }

    #[test]
    fn power_placeholder_does_not_use_up_the_control_lock() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner = rig.scanner(&matrix, &button, |modes| {
                modes.change_mode(Mode::Second);
                modes.toggle_control_lock();
                modes.change_mode(Mode::AlphaLower);
            });
            // Power held and released with no matrix key injects nothing
            // and must leave the lock armed.
            button.down.set(true);
            scanner.tick().unwrap();
            button.down.set(false);
            scanner.tick().unwrap();
            settle(&mut scanner);
            assert!(scanner.modes.control_lock_armed());

            // The next real key still gets the amplification.
            matrix.press(2, 1); // 'd'
            scanner.tick().unwrap();
            matrix.release(2, 1);
            settle(&mut scanner);
            assert!(!scanner.modes.control_lock_armed());
        }
        assert_eq!(
            rig.injector.events,
            vec![
                (CTRL_KEY, true),
                (Key::KEY_D, true),
                (Key::KEY_D, false),
                (CTRL_KEY, false),
            ]
        );
    }

    #[test]
    fn power_key_in_second_shuts_down_exactly_once() {
        let matrix = FakeMatrix::default();
        let button = FakeButton::default();
        let mut rig = Rig::new();
        {
            let mut scanner =
                rig.scanner(&matrix, &button, |modes| modes.change_mode(Mode::Second));
            button.down.set(true);
            assert!(scanner.tick().unwrap());
            assert!(scanner.tick().unwrap());
            assert!(scanner.tick().unwrap());
            button.down.set(false);
            assert!(!scanner.tick().unwrap());
        }
        assert_eq!(rig.power.shutdowns, 1);
        assert!(rig.injector.events.is_empty());
    }
}

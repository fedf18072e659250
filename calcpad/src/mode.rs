//! Mode state machine: current/previous mode plus the two sticky locks.
//!
//! All mutation funnels through [ModeController] so the transition
//! invariants are enforced in one place.

use crate::indicator::StatusIndicator;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Calculator,
    Normal,
    AlphaUpper,
    AlphaLower,
    Second,
}

impl Mode {
    /// Base modes carry no alpha lock and are never transient.
    pub fn is_base(self) -> bool {
        matches!(self, Mode::Calculator | Mode::Normal)
    }

    pub fn is_alpha(self) -> bool {
        matches!(self, Mode::AlphaUpper | Mode::AlphaLower)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ModeState {
    pub current: Mode,
    pub previous: Mode,
    pub alpha_lock: bool,
    pub control_lock: bool,
}

pub struct ModeController<'a> {
    state: ModeState,
    indicator: &'a mut dyn StatusIndicator,
}

impl<'a> ModeController<'a> {
    pub fn new(start: Mode, indicator: &'a mut dyn StatusIndicator) -> Self {
        let mut controller = ModeController {
            state: ModeState {
                current: start,
                previous: start,
                alpha_lock: false,
                control_lock: false,
            },
            indicator,
        };
        controller.notify();
        controller
    }

    pub fn current(&self) -> Mode {
        self.state.current
    }

    pub fn state(&self) -> ModeState {
        self.state
    }

    fn notify(&mut self) {
        // The indicator is cosmetic; a failed update must not stall the scan.
        if let Err(e) = self.indicator.show_mode(self.state.current) {
            warn!("Failed to update status indicator: {}", e);
        }
    }

    /// Unconditional transition. Entering a base mode drops both locks;
    /// entering Second drops the control lock only. The alpha lock
    /// survives a Second round-trip so a locked alpha mode comes back
    /// still locked.
    pub fn change_mode(&mut self, new: Mode) {
        info!("Mode change: {:?} -> {:?}", self.state.current, new);
        self.state.previous = self.state.current;
        self.state.current = new;
        if new.is_base() {
            self.state.alpha_lock = false;
            self.state.control_lock = false;
        } else if new == Mode::Second {
            self.state.control_lock = false;
        }
        self.notify();
    }

    /// Toggles between the two base modes. Used by the power-key
    /// shortcut combo; any non-Calculator mode flips to Calculator.
    pub fn cycle_base_mode(&mut self) {
        if self.state.current == Mode::Calculator {
            self.change_mode(Mode::Normal);
        } else {
            self.change_mode(Mode::Calculator);
        }
    }

    /// Flips the alpha lock and re-enters the alpha mode it applies to,
    /// so the lock takes visible effect immediately.
    ///
    /// Only meaningful while in Second mode; elsewhere it is ignored.
    pub fn toggle_alpha_lock(&mut self) {
        if self.state.current != Mode::Second {
            debug!("Alpha lock toggled outside Second mode; ignored");
            return;
        }
        self.state.alpha_lock = !self.state.alpha_lock;
        let target = if self.state.previous.is_alpha() {
            self.state.previous
        } else {
            Mode::AlphaLower
        };
        self.change_mode(target);
    }

    /// Flips the control lock. No mode change; the flag amplifies the
    /// next emulated keystroke and is consumed by it.
    pub fn toggle_control_lock(&mut self) {
        self.state.control_lock = !self.state.control_lock;
        info!("Control lock {}", if self.state.control_lock { "on" } else { "off" });
    }

    /// Whether the next emulated keystroke should carry the control
    /// modifier.
    pub fn control_lock_armed(&self) -> bool {
        self.state.control_lock
    }

    /// Clears the single-shot control lock after one use. While still in
    /// Second mode the lock persists, so it can be applied to the key
    /// pressed after leaving.
    pub fn consume_control_lock(&mut self) {
        if self.state.control_lock && self.state.current != Mode::Second {
            self.state.control_lock = false;
        }
    }

    /// Collapses a transient mode: Second restores the previous mode, an
    /// unlocked alpha mode falls back to Normal, anything else stays.
    pub fn return_from_transient(&mut self) {
        if self.state.current == Mode::Second {
            let target = self.state.previous;
            self.change_mode(target);
        } else if self.state.current.is_alpha() && !self.state.alpha_lock {
            self.change_mode(Mode::Normal);
        }
    }
}

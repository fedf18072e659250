//! Key emulation: turns a resolved symbol plus modifier flags into an
//! ordered sequence of injected events.

use crate::inject::KeyInjector;
use crate::keys::{CTRL_KEY, SHIFT_KEY};
use crate::layout::Symbol;
use log::warn;
use std::io;

pub struct KeyEmulator<'a> {
    injector: &'a mut dyn KeyInjector,
}

impl<'a> KeyEmulator<'a> {
    pub fn new(injector: &'a mut dyn KeyInjector) -> Self {
        KeyEmulator { injector }
    }

    /// Presses a symbol: shift down if required, control down if the
    /// lock is armed, then the key itself. Sentinel and command symbols
    /// are no-ops (commands are consumed by the dispatcher and should
    /// never get here).
    pub fn press(&mut self, symbol: Symbol, control_lock: bool) -> io::Result<()> {
        let Symbol::Key(sym) = symbol else {
            return Ok(());
        };
        let Some(code) = sym.key_code() else {
            warn!("No key code for {:?}; skipping", sym);
            return Ok(());
        };

        if sym.shift_required() {
            self.injector.inject(SHIFT_KEY, true)?;
        }
        if control_lock {
            self.injector.inject(CTRL_KEY, true)?;
        }
        self.injector.inject(code, true)
    }

    /// Releases a symbol: teardown in reverse order of [press].
    pub fn release(&mut self, symbol: Symbol, control_lock: bool) -> io::Result<()> {
        let Symbol::Key(sym) = symbol else {
            return Ok(());
        };
        let Some(code) = sym.key_code() else {
            return Ok(());
        };

        self.injector.inject(code, false)?;
        if control_lock {
            self.injector.inject(CTRL_KEY, false)?;
        }
        if sym.shift_required() {
            self.injector.inject(SHIFT_KEY, false)?;
        }
        Ok(())
    }
}

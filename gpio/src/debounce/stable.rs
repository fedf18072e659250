use crate::{GpioInput, GpioResult};
use std::cell::Cell;
use std::fmt::{Debug, Formatter};

/// A debounced GPIO input that only reports a change after the raw input
/// has read the new level a number of consecutive times.
///
/// Meant to be polled on a fixed period; with the default threshold of 5
/// and a 5 ms poll, a level has to be stable for ~25 ms to get through.
pub struct StableDebounce<'a> {
    input: &'a dyn GpioInput,
    state: Cell<bool>,
    streak: Cell<u8>,
    pub threshold: u8,
}

impl<'a> StableDebounce<'a> {
    pub fn new(input: &'a dyn GpioInput) -> Self {
        Self {
            input,
            state: Cell::new(false),
            streak: Cell::new(0),
            threshold: 5,
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }
}

impl Debug for StableDebounce<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}(debounced)", self.input)
    }
}

impl GpioInput for StableDebounce<'_> {
    fn read(&self) -> GpioResult<bool> {
        let raw = self.input.read()?;
        let state = self.state.get();

        if raw == state {
            self.streak.set(0);
            return Ok(state);
        }

        let streak = self.streak.get() + 1;
        if streak >= self.threshold {
            self.streak.set(0);
            self.state.set(raw);
            Ok(raw)
        } else {
            self.streak.set(streak);
            Ok(state)
        }
    }
}

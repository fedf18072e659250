//! Driver for the 74HC595 serial-in, parallel-out shift register.
//!
//! Bits are clocked in MSb first over a data and clock pin, then committed
//! to the output stage with a latch pulse, so all outputs change at once.

use crate::{GpioOutput, GpioResult};
use std::fmt::{Debug, Formatter};

pub struct ShiftRegister595<'a> {
    data: &'a dyn GpioOutput,
    clock: &'a dyn GpioOutput,
    latch: &'a dyn GpioOutput,
    stages: usize,
}

impl<'a> ShiftRegister595<'a> {
    /// Creates a driver for a chain of `stages` output bits
    /// (8 per physical chip).
    pub fn new(
        data: &'a dyn GpioOutput,
        clock: &'a dyn GpioOutput,
        latch: &'a dyn GpioOutput,
        stages: usize,
    ) -> Self {
        ShiftRegister595 {
            data,
            clock,
            latch,
            stages,
        }
    }

    pub fn stages(&self) -> usize {
        self.stages
    }

    /// Shifts out all stages, LSb of `value` ending up on output 0,
    /// and latches the result.
    pub fn write(&self, value: u32) -> GpioResult<()> {
        self.latch.write(false)?;
        for bit in (0..self.stages).rev() {
            self.clock.write(false)?;
            self.data.write(value & (1 << bit) != 0)?;
            self.clock.write(true)?;
        }
        self.clock.write(false)?;
        self.latch.write(true)?;
        Ok(())
    }

    /// Drives exactly one output high, all others low.
    pub fn select_bit(&self, bit: usize) -> GpioResult<()> {
        self.write(1 << bit)
    }
}

impl Debug for ShiftRegister595<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ShiftRegister595({:?}, {:?}, {:?}; {} stages)",
            self.data, self.clock, self.latch, self.stages
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct RecordingOutput {
        writes: RefCell<Vec<bool>>,
    }

    impl GpioOutput for RecordingOutput {
        fn write(&self, value: bool) -> GpioResult<()> {
            self.writes.borrow_mut().push(value);
            Ok(())
        }
    }

    /// Extracts the data-pin levels sampled at each rising clock edge.
    fn clocked_bits(data: &RecordingOutput, clock: &RecordingOutput) -> Vec<bool> {
        // write() interleaves: clock low, data, clock high, per stage.
        let data = data.writes.borrow();
        let clock = clock.writes.borrow();
        assert_eq!(clock.len(), data.len() * 2 + 1);
        data.clone()
    }

    #[test]
    fn shifts_msb_first() {
        let data = RecordingOutput::default();
        let clock = RecordingOutput::default();
        let latch = RecordingOutput::default();
        let sr = ShiftRegister595::new(&data, &clock, &latch, 8);

        sr.write(0b1000_0110).unwrap();

        let bits = clocked_bits(&data, &clock);
        assert_eq!(
            bits,
            vec![true, false, false, false, false, true, true, false]
        );
    }

    #[test]
    fn select_bit_sets_single_output() {
        let data = RecordingOutput::default();
        let clock = RecordingOutput::default();
        let latch = RecordingOutput::default();
        let sr = ShiftRegister595::new(&data, &clock, &latch, 8);

        sr.select_bit(2).unwrap();

        let bits = clocked_bits(&data, &clock);
        assert_eq!(bits.iter().filter(|&&b| b).count(), 1);
        // MSb first: output 2 is the third bit from the end.
        assert!(bits[8 - 1 - 2]);
    }

    #[test]
    fn latch_frames_the_transfer() {
        let data = RecordingOutput::default();
        let clock = RecordingOutput::default();
        let latch = RecordingOutput::default();
        let sr = ShiftRegister595::new(&data, &clock, &latch, 8);

        sr.write(0xFF).unwrap();

        assert_eq!(*latch.writes.borrow(), vec![false, true]);
    }
}

use crate::keypad::KeypadMatrix;
use crate::sr595::ShiftRegister595;
use crate::{GpioError, GpioInput, GpioResult};
use std::fmt::{Debug, Formatter};

/// A key matrix whose rows hang off a 74HC595 shift register and whose
/// columns are read from individual GPIO inputs.
///
/// The column inputs are expected to be pulled down and read active-high;
/// the column count is whatever number of inputs the caller wires up.
pub struct ShiftRegisterMatrix<'a> {
    rows: ShiftRegister595<'a>,
    cols: Vec<&'a dyn GpioInput>,
}

impl<'a> ShiftRegisterMatrix<'a> {
    pub fn new(rows: ShiftRegister595<'a>, cols: Vec<&'a dyn GpioInput>) -> Self {
        ShiftRegisterMatrix { rows, cols }
    }
}

impl Debug for ShiftRegisterMatrix<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ShiftRegisterMatrix({:?}, {} cols)",
            self.rows,
            self.cols.len()
        )
    }
}

impl KeypadMatrix for ShiftRegisterMatrix<'_> {
    fn row_count(&self) -> usize {
        self.rows.stages()
    }

    fn col_count(&self) -> usize {
        self.cols.len()
    }

    fn select_row(&self, row: usize) -> GpioResult<()> {
        if row >= self.row_count() {
            return Err(GpioError::InvalidArgument);
        }
        self.rows.select_bit(row)
    }

    fn read_column(&self, col: usize) -> GpioResult<bool> {
        self.cols
            .get(col)
            .ok_or(GpioError::InvalidArgument)?
            .read()
    }
}

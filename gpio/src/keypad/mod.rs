mod sr595;

use crate::GpioResult;
use std::fmt::Debug;
pub use sr595::*;

/// Low-level access to a scanned key matrix.
///
/// One row is energized at a time; a pressed key shows up as its column
/// input reading active while its row is selected.
pub trait KeypadMatrix: Debug {
    fn row_count(&self) -> usize;
    fn col_count(&self) -> usize;

    /// Energizes a single row, deselecting all others.
    fn select_row(&self, row: usize) -> GpioResult<()>;

    /// Reads one column input. `true` means a key on the currently
    /// selected row and this column is closed.
    fn read_column(&self, col: usize) -> GpioResult<bool>;
}

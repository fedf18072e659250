mod stable;

pub use stable::*;

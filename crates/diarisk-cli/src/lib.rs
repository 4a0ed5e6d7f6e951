//! Command implementations behind the `diarisk` binary.
pub mod history;
pub mod predict;
pub mod train;
pub mod util;

mod command;
mod depth;
mod error;
mod flip;
mod heap;
mod shelf;

pub use crate::command::{execute, parse, run_file, run_script, Command};
pub use crate::depth::Depth;
pub use crate::error::ShelfError;
pub use crate::flip::FlipLedger;
pub use crate::heap::{Reservation, ReserveHeap, RESERVE_CAPACITY};
pub use crate::shelf::{BookEntry, BorrowOutcome, ReturnOutcome, Shelf, Stats};

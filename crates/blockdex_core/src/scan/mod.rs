//! Forward scanning of the segment sequence.
//!
//! Record boundaries are only discoverable by decoding, so the scan is
//! strictly sequential: [`ScanPosition::step`] decodes one record and
//! yields the position after it, and [`Replayer`] folds those steps into
//! an index.
//!
//! ## Termination Policy
//!
//! - **End of data**: the locator reports no segment at the next index.
//!   This is the only clean stop.
//! - **Fatal**: anything unreadable inside a segment that exists, including
//!   a record whose span would pass the segment's end. No heuristic
//!   truncation is attempted.

mod cursor;
mod replay;

pub use cursor::{ScanPosition, Step};
pub use replay::{IndexEntry, Replay, Replayer};

//! Index recovery: replay every segment, then publish the result in one commit.

mod driver;
mod transaction;

pub use driver::RecoveryDriver;
pub use transaction::RecoveryTransaction;

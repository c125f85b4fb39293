//! Distributed lock over a conditional-write store

mod handle;
mod keeper;

pub use handle::DynamoLock;
pub use keeper::{KeeperExit, LeaseKeeper};

//! Dynalock Store - Backing store capability and implementations
//!
//! This crate provides:
//! - The `LockStore` capability trait used by the lock engine
//! - Lock record, table and TTL models
//! - Write conditions with bound-parameter rendering
//! - An in-memory store for tests and single-process use
//! - A DynamoDB store (feature `dynamodb`)

pub mod condition;
pub mod memory;
pub mod model;
pub mod traits;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub use condition::{BoundValue, ConditionExpression, WriteCondition};
pub use memory::{CallCounts, MemoryLockStore};
pub use model::{
    LockItem, PutOutcome, TableDescription, TableSpec, TableStatus, TtlDescription, TtlStatus,
};
pub use traits::LockStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::{DynamoDbLockStore, DynamoDbStoreConfig};

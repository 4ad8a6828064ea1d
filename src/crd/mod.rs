//! Custom Resource Definitions for redis-failover.

mod redis_failover;

pub use redis_failover::*;

//! Error types for resource pooling.

use thiserror::Error;

/// Boxed error returned by [`ResourceFactory::create`](crate::ResourceFactory::create).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when acquiring a pooled resource.
#[derive(Debug, Error)]
pub enum PoolError {
	/// Non-blocking acquisition found every slot leased.
	#[error("no resources available: all {capacity} slots are leased")]
	Exhausted {
		/// Capacity of the pool at the time of the call.
		capacity: usize,
	},

	/// Bounded acquisition gave up before a slot was freed.
	#[error("timed out waiting for a resource: all {capacity} slots are leased")]
	Timeout {
		/// Capacity of the pool when the wait expired.
		capacity: usize,
	},

	/// The factory failed to spawn a new resource. The reserved slot is freed.
	#[error("failed to create pooled resource: {0}")]
	Create(#[source] BoxError),
}

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

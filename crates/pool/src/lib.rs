//! Bounded pool of expensive external resources.
//!
//! A [`ResourcePool`] amortizes things like database handles or remote
//! contexts across threads. It never holds more than `capacity` resources
//! (idle plus leased), hands out idle resources before creating new ones, and
//! silently replaces resources the [`ResourceFactory`] reports as invalid.
//!
//! ```rust,ignore
//! let pool = ResourcePool::new(MySqlFactory::new(cfg), 8);
//! let conn = pool.acquire()?;
//! conn.query("SELECT 1")?;
//! // `conn` goes back to the pool here
//! ```

mod error;
mod lease;


use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

pub use error::{BoxError, PoolError, Result};
pub use lease::Lease;

/// Creates, checks and destroys the resources held by a [`ResourcePool`].
///
/// The pool is agnostic of what it stores; everything resource-specific
/// lives here.
pub trait ResourceFactory: Send + Sync {
	/// The pooled resource.
	type Resource: Send;

	/// Spawns a new resource.
	fn create(&self) -> std::result::Result<Self::Resource, BoxError>;

	/// Tears a resource down. Defaults to dropping it.
	fn destroy(&self, resource: Self::Resource) {
		drop(resource);
	}

	/// Whether the resource can still be used (e.g. the connection is alive).
	fn is_valid(&self, _resource: &Self::Resource) -> bool {
		true
	}
}

#[derive(Debug, Clone, Copy)]
enum Wait {
	Never,
	Forever,
	Until(Instant),
}

struct PoolState<R> {
	idle: VecDeque<R>,
	leased: usize,
	capacity: usize,
}

/// Thread-safe pool of resources created on demand by a [`ResourceFactory`].
///
/// Invariant: `idle_count() + leased_count() <= capacity()` whenever no
/// operation is in progress.
pub struct ResourcePool<F: ResourceFactory> {
	factory: F,
	state: Mutex<PoolState<F::Resource>>,
	available: Condvar,
}

impl<F: ResourceFactory> ResourcePool<F> {
	/// Creates an empty pool that will hold at most `capacity` resources.
	pub fn new(factory: F, capacity: usize) -> Self {
		Self {
			factory,
			state: Mutex::new(PoolState {
				idle: VecDeque::new(),
				leased: 0,
				capacity,
			}),
			available: Condvar::new(),
		}
	}

	/// Returns the factory backing this pool.
	pub fn factory(&self) -> &F {
		&self.factory
	}

	/// Acquires a resource, blocking the calling thread until a slot frees up.
	///
	/// Only a factory failure can make this return an error.
	pub fn acquire(&self) -> Result<Lease<'_, F>> {
		self.checkout(Wait::Forever)
			.map(|resource| Lease::new(self, resource))
	}

	/// Acquires a resource without waiting.
	///
	/// Fails with [`PoolError::Exhausted`] when every slot is leased.
	pub fn try_acquire(&self) -> Result<Lease<'_, F>> {
		self.checkout(Wait::Never)
			.map(|resource| Lease::new(self, resource))
	}

	/// Acquires a resource, waiting at most `timeout` for a slot.
	///
	/// A timeout too large to represent as a deadline waits like [`acquire`](Self::acquire).
	pub fn acquire_timeout(&self, timeout: Duration) -> Result<Lease<'_, F>> {
		let wait = Instant::now()
			.checked_add(timeout)
			.map_or(Wait::Forever, Wait::Until);
		self.checkout(wait)
			.map(|resource| Lease::new(self, resource))
	}

	/// Returns a resource to the pool.
	///
	/// Invalid resources, and resources above a capacity lowered by
	/// [`resize`](Self::resize) while they were leased, are destroyed instead
	/// of kept idle. Called automatically when a [`Lease`] is dropped.
	pub fn release(&self, resource: F::Resource) {
		let valid = self.factory.is_valid(&resource);
		let discarded = {
			let mut state = self.state.lock();
			state.leased = state.leased.saturating_sub(1);
			if valid && state.idle.len() + state.leased < state.capacity {
				state.idle.push_back(resource);
				None
			} else {
				Some(resource)
			}
		};
		self.available.notify_one();

		if let Some(resource) = discarded {
			tracing::trace!(valid, "destroying released resource");
			self.factory.destroy(resource);
		}
	}

	/// Changes the capacity.
	///
	/// Shrinking destroys idle surplus immediately; leased surplus is
	/// destroyed as it is released. Growing wakes every blocked caller.
	pub fn resize(&self, capacity: usize) {
		let surplus: Vec<_> = {
			let mut state = self.state.lock();
			let grew = capacity > state.capacity;
			state.capacity = capacity;

			let keep = capacity.saturating_sub(state.leased);
			let excess = state.idle.len().saturating_sub(keep);
			let surplus = state.idle.drain(..excess).collect();

			if grew {
				self.available.notify_all();
			}
			surplus
		};

		if !surplus.is_empty() {
			tracing::debug!(capacity, destroyed = surplus.len(), "shrinking resource pool");
		}
		for resource in surplus {
			self.factory.destroy(resource);
		}
	}

	/// Current capacity.
	pub fn capacity(&self) -> usize {
		self.state.lock().capacity
	}

	/// Number of resources waiting to be reused.
	pub fn idle_count(&self) -> usize {
		self.state.lock().idle.len()
	}

	/// Number of resources currently handed out.
	pub fn leased_count(&self) -> usize {
		self.state.lock().leased
	}

	fn checkout(&self, wait: Wait) -> Result<F::Resource> {
		let reused = {
			let mut state = self.state.lock();
			while state.leased >= state.capacity {
				match wait {
					Wait::Never => {
						return Err(PoolError::Exhausted {
							capacity: state.capacity,
						});
					}
					Wait::Forever => self.available.wait(&mut state),
					Wait::Until(deadline) => {
						let timed_out = self.available.wait_until(&mut state, deadline).timed_out();
						if timed_out && state.leased >= state.capacity {
							return Err(PoolError::Timeout {
								capacity: state.capacity,
							});
						}
					}
				}
			}
			// Reserve the slot before touching the factory so the lock is not
			// held across potentially slow calls.
			state.leased += 1;
			state.idle.pop_front()
		};

		if let Some(resource) = reused {
			if self.factory.is_valid(&resource) {
				return Ok(resource);
			}
			tracing::debug!("replacing invalid idle resource");
			self.factory.destroy(resource);
		}

		match self.factory.create() {
			Ok(resource) => Ok(resource),
			Err(source) => {
				{
					let mut state = self.state.lock();
					state.leased = state.leased.saturating_sub(1);
				}
				self.available.notify_one();
				Err(PoolError::Create(source))
			}
		}
	}
}

impl<F: ResourceFactory> Drop for ResourcePool<F> {
	fn drop(&mut self) {
		let state = self.state.get_mut();
		if state.leased > 0 {
			tracing::warn!(leased = state.leased, "resource pool dropped with resources still leased");
		}
		for resource in state.idle.drain(..) {
			self.factory.destroy(resource);
		}
	}
}

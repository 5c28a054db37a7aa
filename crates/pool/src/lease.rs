use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};

use crate::{ResourceFactory, ResourcePool};

/// A resource borrowed from a [`ResourcePool`].
///
/// The resource goes back to the pool when the lease is dropped, where it is
/// revalidated before being offered to the next caller.
pub struct Lease<'a, F: ResourceFactory> {
	pool: &'a ResourcePool<F>,
	resource: ManuallyDrop<F::Resource>,
}

impl<'a, F: ResourceFactory> Lease<'a, F> {
	pub(crate) fn new(pool: &'a ResourcePool<F>, resource: F::Resource) -> Self {
		Self {
			pool,
			resource: ManuallyDrop::new(resource),
		}
	}

	/// Detaches the resource from the guard.
	///
	/// The slot stays leased until the resource is handed back with
	/// [`ResourcePool::release`].
	pub fn into_inner(self) -> F::Resource {
		let mut this = ManuallyDrop::new(self);
		// SAFETY: `this` is never dropped, so the resource is taken exactly once.
		unsafe { ManuallyDrop::take(&mut this.resource) }
	}
}

impl<F: ResourceFactory> Deref for Lease<'_, F> {
	type Target = F::Resource;

	fn deref(&self) -> &Self::Target {
		&self.resource
	}
}

impl<F: ResourceFactory> DerefMut for Lease<'_, F> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.resource
	}
}

impl<F: ResourceFactory> Drop for Lease<'_, F> {
	fn drop(&mut self) {
		// SAFETY: drop runs once and the field is not touched afterwards.
		let resource = unsafe { ManuallyDrop::take(&mut self.resource) };
		self.pool.release(resource);
	}
}

impl<F> fmt::Debug for Lease<'_, F>
where
	F: ResourceFactory,
	F::Resource: fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Lease").field(&*self.resource).finish()
	}
}

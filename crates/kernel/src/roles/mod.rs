//! The abstract roles a [`StackInstance`](crate::StackInstance) is built from.
//!
//! Every operation has a default body returning
//! [`KernelError::NotImplemented`], so implementations, and decorators in
//! particular, only provide what they support.

mod authn;
mod catalog;
mod inode;
mod io;
mod pool;

use std::sync::Arc;

pub use authn::Authn;
pub use catalog::Catalog;
use catena_security::SecurityContext;
pub use inode::INode;
pub use io::{IODriver, IOHandler, OpenFlags};
use parking_lot::RwLock;
pub use pool::{PoolDriver, PoolHandler, PoolManager};

use crate::error::{KernelError, Result};
use crate::stack::StackHandle;

/// Common base of every role object.
///
/// Methods take `&self`; objects keep whatever they are handed behind
/// interior mutability (see [`SecurityCell`]).
pub trait BaseInterface: Send + Sync {
	/// Identifies the implementation, e.g. `"ProfilerCatalog"`.
	fn impl_id(&self) -> &str;

	/// Called once after the owning stack is fully built.
	///
	/// Decorators forward this to the object they wrap.
	fn set_stack_instance(&self, _stack: StackHandle) -> Result<()> {
		Ok(())
	}

	/// Called every time the stack's security context is replaced.
	fn set_security_context(&self, _context: Arc<SecurityContext>) -> Result<()> {
		Ok(())
	}
}

/// Slot for the security context pushed into a role object.
#[derive(Debug, Default)]
pub struct SecurityCell(RwLock<Option<Arc<SecurityContext>>>);

impl SecurityCell {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&self, context: Arc<SecurityContext>) {
		*self.0.write() = Some(context);
	}

	/// The stored context, or [`KernelError::NoSecurityContext`].
	pub fn get(&self) -> Result<Arc<SecurityContext>> {
		self.0.read().clone().ok_or(KernelError::NoSecurityContext)
	}

	pub fn is_set(&self) -> bool {
		self.0.read().is_some()
	}
}

/// Shorthand used by the default trait bodies.
fn unsupported<T>(this: &(impl BaseInterface + ?Sized), operation: &'static str) -> Result<T> {
	Err(KernelError::not_implemented(this.impl_id(), operation))
}

use super::{BaseInterface, unsupported};
use crate::error::{KernelError, Result};
use crate::types::{Location, Pool, PoolAvailability};

/// Knows the pools and picks where data goes.
pub trait PoolManager: BaseInterface {
	fn pools(&self, _availability: PoolAvailability) -> Result<Vec<Pool>> {
		unsupported(self, "pools")
	}

	fn pool(&self, _name: &str) -> Result<Pool> {
		unsupported(self, "pool")
	}

	fn where_to_read(&self, _path: &str) -> Result<Location> {
		unsupported(self, "where_to_read")
	}

	fn where_to_write(&self, _path: &str) -> Result<Location> {
		unsupported(self, "where_to_write")
	}
}

/// Driver for one pool type, cached per type by the stack.
pub trait PoolDriver: BaseInterface {
	fn create_pool_handler(&self, _pool_name: &str) -> Result<Box<dyn PoolHandler>> {
		unsupported(self, "create_pool_handler")
	}
}

/// Operations on a single pool.
pub trait PoolHandler: Send {
	fn pool_type(&self) -> &str;

	fn pool_name(&self) -> &str;

	fn total_space(&self) -> Result<u64> {
		Err(KernelError::not_implemented(self.pool_type(), "total_space"))
	}

	fn free_space(&self) -> Result<u64> {
		Err(KernelError::not_implemented(self.pool_type(), "free_space"))
	}

	fn is_available(&self, _for_write: bool) -> Result<bool> {
		Err(KernelError::not_implemented(self.pool_type(), "is_available"))
	}

	fn where_to_write(&self, _path: &str) -> Result<Location> {
		Err(KernelError::not_implemented(self.pool_type(), "where_to_write"))
	}
}

//! Factories registered with the [`PluginManager`].
//!
//! A factory is created once per process and produces one role object per
//! stack. Decorating factories keep the factory that was on top when they
//! registered and ask it for the wrapped object.

use crate::error::{KernelError, Result};
use crate::manager::PluginManager;
use crate::roles::{Authn, Catalog, INode, IODriver, PoolDriver, PoolManager};

/// Configuration entry point shared by every factory.
pub trait BaseFactory: Send + Sync {
	/// Offers an option to the factory.
	///
	/// Return [`KernelError::UnknownOption`] for keys the factory does not
	/// handle; any other error aborts configuration.
	fn configure(&self, key: &str, _value: &str) -> Result<()> {
		Err(KernelError::UnknownOption { key: key.to_string() })
	}
}

pub trait AuthnFactory: BaseFactory {
	fn create_authn(&self, manager: &PluginManager) -> Result<Box<dyn Authn>>;
}

pub trait INodeFactory: BaseFactory {
	fn create_inode(&self, manager: &PluginManager) -> Result<Box<dyn INode>>;
}

pub trait CatalogFactory: BaseFactory {
	fn create_catalog(&self, manager: &PluginManager) -> Result<Box<dyn Catalog>>;
}

pub trait PoolManagerFactory: BaseFactory {
	fn create_pool_manager(&self, manager: &PluginManager) -> Result<Box<dyn PoolManager>>;
}

pub trait IODriverFactory: BaseFactory {
	fn create_io_driver(&self, manager: &PluginManager) -> Result<Box<dyn IODriver>>;
}

pub trait PoolDriverFactory: BaseFactory {
	/// The pool type this factory's drivers handle, e.g. `"filesystem"`.
	fn implemented_pool(&self) -> &str;

	fn create_pool_driver(&self, manager: &PluginManager) -> Result<Box<dyn PoolDriver>>;
}

//! Plugin registry and per-request composition runtime.
//!
//! Implementations of the abstract roles ([`Catalog`], [`INode`],
//! [`PoolManager`], [`IODriver`], [`Authn`], [`PoolDriver`]) are provided by
//! factories registered with a [`PluginManager`], usually from plugins named
//! in a configuration file. Registering a factory on top of another lets it
//! decorate the one below. A [`StackInstance`] instantiates the top of
//! every role for one request and shares a single security context among
//! them.
//!
//! ```rust,ignore
//! let mut manager = PluginManager::with_builtins();
//! manager.load_configuration("/etc/catena/catena.conf")?;
//! let manager = Arc::new(manager);
//!
//! let mut stack = StackInstance::new(manager.clone())?;
//! stack.set_security_credentials(&credentials)?;
//! let stat = stack.catalog()?.extended_stat("/dteam/file", true)?;
//! ```

mod builtin;
mod error;
mod factory;
mod manager;
pub mod options;
mod plugin;
mod roles;
mod stack;
mod types;

// Dev-dependencies only exercised by the integration tests.
#[cfg(test)]
use {pretty_assertions as _, rstest as _, tempfile as _, tracing_subscriber as _};

pub use builtin::{BuiltinAuthn, BuiltinAuthnFactory};
pub use error::{ErrorKind, KernelError, Result, Role};
pub use factory::{
	AuthnFactory, BaseFactory, CatalogFactory, INodeFactory, IODriverFactory, PoolDriverFactory,
	PoolManagerFactory,
};
pub use manager::PluginManager;
pub use plugin::{API_VERSION, DylibLoader, PluginIdCard, PluginLoader, RegisterFn, StaticLoader};
pub use roles::{
	Authn, BaseInterface, Catalog, INode, IODriver, IOHandler, OpenFlags, PoolDriver, PoolHandler,
	PoolManager, SecurityCell,
};
pub use stack::{StackHandle, StackInstance, StackState, StackValue};
pub use types::{
	Chunk, ExtendedStat, FileStatus, Location, Pool, PoolAvailability, Replica, ReplicaKind,
	ReplicaStatus,
};

// Re-exported so plugins need a single dependency.
pub use {catena_pool as pool, catena_security as security};

//! Per-request composition of role objects.

mod value;


use std::collections::hash_map::Entry;
use std::sync::{Arc, Weak};

use catena_security::{SecurityContext, SecurityCredentials};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

pub use value::StackValue;

use crate::error::{ErrorKind, KernelError, Result, Role, catch_panic};
use crate::manager::PluginManager;
use crate::roles::{Authn, BaseInterface, Catalog, INode, IODriver, PoolDriver, PoolManager};

/// Lifecycle of a [`StackInstance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackState {
	/// Role objects exist but no security context was set.
	RolesBound,
	CredentialsSet,
}

/// State reachable from role objects through a [`StackHandle`].
struct StackShared {
	authn: Option<Box<dyn Authn>>,
	inode: Option<Box<dyn INode>>,
	catalog: Option<Box<dyn Catalog>>,
	pool_manager: Option<Box<dyn PoolManager>>,
	io_driver: Option<Box<dyn IODriver>>,
	values: Mutex<FxHashMap<String, StackValue>>,
	security: RwLock<Option<Arc<SecurityContext>>>,
}

impl StackShared {
	/// Present role objects in construction order.
	fn roles(&self) -> impl Iterator<Item = &dyn BaseInterface> {
		[
			self.authn.as_deref().map(|r| r as &dyn BaseInterface),
			self.inode.as_deref().map(|r| r as &dyn BaseInterface),
			self.catalog.as_deref().map(|r| r as &dyn BaseInterface),
			self.pool_manager.as_deref().map(|r| r as &dyn BaseInterface),
			self.io_driver.as_deref().map(|r| r as &dyn BaseInterface),
		]
		.into_iter()
		.flatten()
	}

	fn security_context(&self) -> Result<Arc<SecurityContext>> {
		self.security.read().clone().ok_or(KernelError::NoSecurityContext)
	}

	fn get(&self, key: &str) -> Result<StackValue> {
		self.values
			.lock()
			.get(key)
			.cloned()
			.ok_or_else(|| KernelError::UnknownKey(key.to_string()))
	}
}

impl Drop for StackShared {
	fn drop(&mut self) {
		// Reverse construction order.
		drop(self.io_driver.take());
		drop(self.pool_manager.take());
		drop(self.catalog.take());
		drop(self.inode.take());
		drop(self.authn.take());
	}
}

/// A set of role objects built for one request or session.
///
/// Created from the current top factory of each role. Role objects reach
/// their siblings, the side channel and the security context through the
/// [`StackHandle`] they receive once the stack is complete.
pub struct StackInstance {
	// Field order is drop order: role objects, then pool drivers.
	shared: Arc<StackShared>,
	pool_drivers: FxHashMap<String, Box<dyn PoolDriver>>,
	manager: Arc<PluginManager>,
}

/// Instantiates one role; a missing factory leaves the role absent.
fn instantiate<F: ?Sized, T: ?Sized>(
	role: Role,
	factory: Result<Arc<F>>,
	create: impl FnOnce(&F) -> Result<Box<T>>,
) -> Result<Option<Box<T>>> {
	let factory = match factory {
		Ok(factory) => factory,
		Err(err) if err.kind() == ErrorKind::NoFactory => {
			tracing::trace!(%role, "no factory, role left empty");
			return Ok(None);
		}
		Err(err) => return Err(err),
	};
	catch_panic(&format!("creation of the {role}"), || create(&*factory)).map(Some)
}

impl StackInstance {
	/// Builds a stack from the manager's top factories.
	///
	/// Roles are created in the order authn, inode, catalog, pool manager,
	/// I/O driver, then each object receives its [`StackHandle`].
	pub fn new(manager: Arc<PluginManager>) -> Result<Self> {
		let pm = manager.as_ref();
		let authn = instantiate(Role::Authn, pm.authn_factory(), |f| f.create_authn(pm))?;
		let inode = instantiate(Role::INode, pm.inode_factory(), |f| f.create_inode(pm))?;
		let catalog = instantiate(Role::Catalog, pm.catalog_factory(), |f| f.create_catalog(pm))?;
		let pool_manager = instantiate(Role::PoolManager, pm.pool_manager_factory(), |f| {
			f.create_pool_manager(pm)
		})?;
		let io_driver = instantiate(Role::IODriver, pm.io_driver_factory(), |f| f.create_io_driver(pm))?;

		let stack = Self {
			shared: Arc::new(StackShared {
				authn,
				inode,
				catalog,
				pool_manager,
				io_driver,
				values: Mutex::new(FxHashMap::default()),
				security: RwLock::new(None),
			}),
			pool_drivers: FxHashMap::default(),
			manager,
		};

		let handle = stack.handle();
		for role in stack.shared.roles() {
			role.set_stack_instance(handle.clone())?;
		}
		tracing::debug!(roles = stack.shared.roles().count(), "stack instance built");
		Ok(stack)
	}

	pub fn plugin_manager(&self) -> &Arc<PluginManager> {
		&self.manager
	}

	/// A weak handle to this stack.
	pub fn handle(&self) -> StackHandle {
		StackHandle(Arc::downgrade(&self.shared))
	}

	pub fn state(&self) -> StackState {
		if self.shared.security.read().is_some() {
			StackState::CredentialsSet
		} else {
			StackState::RolesBound
		}
	}

	pub fn set(&mut self, key: impl Into<String>, value: impl Into<StackValue>) {
		self.shared.values.lock().insert(key.into(), value.into());
	}

	/// Fails with `UnknownKey` when `key` was never set.
	pub fn get(&self, key: &str) -> Result<StackValue> {
		self.shared.get(key)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.shared.values.lock().contains_key(key)
	}

	pub fn erase(&mut self, key: &str) {
		self.shared.values.lock().remove(key);
	}

	pub fn erase_all(&mut self) {
		self.shared.values.lock().clear();
	}

	/// The authn object; usable before any credentials are set.
	pub fn authn(&self) -> Result<&dyn Authn> {
		self.shared.authn.as_deref().ok_or(KernelError::MissingRole(Role::Authn))
	}

	pub fn inode(&self) -> Result<&dyn INode> {
		self.security_context()?;
		self.shared.inode.as_deref().ok_or(KernelError::MissingRole(Role::INode))
	}

	pub fn catalog(&self) -> Result<&dyn Catalog> {
		self.security_context()?;
		self.shared.catalog.as_deref().ok_or(KernelError::MissingRole(Role::Catalog))
	}

	pub fn pool_manager(&self) -> Result<&dyn PoolManager> {
		self.security_context()?;
		self.shared
			.pool_manager
			.as_deref()
			.ok_or(KernelError::MissingRole(Role::PoolManager))
	}

	pub fn is_pool_manager_present(&self) -> bool {
		self.shared.pool_manager.is_some()
	}

	pub fn io_driver(&self) -> Result<&dyn IODriver> {
		self.security_context()?;
		self.shared
			.io_driver
			.as_deref()
			.ok_or(KernelError::MissingRole(Role::IODriver))
	}

	/// The driver for `pool_type`, instantiated on first use and cached.
	pub fn pool_driver(&mut self, pool_type: &str) -> Result<&dyn PoolDriver> {
		let context = self.security_context()?;
		match self.pool_drivers.entry(pool_type.to_string()) {
			Entry::Occupied(entry) => Ok(&**entry.into_mut()),
			Entry::Vacant(entry) => {
				let factory = self.manager.pool_driver_factory(pool_type)?;
				let driver = catch_panic(&format!("creation of the {pool_type} pool driver"), || {
					factory.create_pool_driver(&self.manager)
				})?;
				driver.set_stack_instance(StackHandle(Arc::downgrade(&self.shared)))?;
				driver.set_security_context(context)?;
				tracing::debug!(pool_type, "pool driver instantiated");
				Ok(&**entry.insert(driver))
			}
		}
	}

	/// Derives a security context through the authn role and installs it.
	///
	/// Needs an authn and at least one of catalog or inode.
	pub fn set_security_credentials(&mut self, credentials: &SecurityCredentials) -> Result<()> {
		let authn = self.authn()?;
		if self.shared.catalog.is_none() && self.shared.inode.is_none() {
			return Err(KernelError::MissingRole(Role::Catalog));
		}
		let context = catch_panic("security context creation", || authn.create_security_context(credentials))?;
		tracing::debug!(
			client = %credentials.client_name,
			uid = context.user().uid,
			"security credentials set"
		);
		self.set_security_context(context)
	}

	/// Installs an externally built context and pushes it everywhere.
	///
	/// The context is only stored once every role and cached pool driver has
	/// accepted it. On failure the previous context, if any, is pushed back.
	pub fn set_security_context(&mut self, context: SecurityContext) -> Result<()> {
		let context = Arc::new(context);
		if let Err(err) = self.push_security_context(&context) {
			let previous = self.shared.security.read().clone();
			if let Some(previous) = previous
				&& let Err(restore) = self.push_security_context(&previous)
			{
				tracing::warn!(error = %restore, "failed to restore the previous security context");
			}
			return Err(err);
		}
		*self.shared.security.write() = Some(context);
		Ok(())
	}

	fn push_security_context(&self, context: &Arc<SecurityContext>) -> Result<()> {
		for role in self.shared.roles() {
			role.set_security_context(context.clone())?;
		}
		for driver in self.pool_drivers.values() {
			driver.set_security_context(context.clone())?;
		}
		Ok(())
	}

	pub fn security_context(&self) -> Result<Arc<SecurityContext>> {
		self.shared.security_context()
	}
}

/// Weak reference to a [`StackInstance`], handed to its role objects.
///
/// Every method fails with [`KernelError::StackReleased`] once the stack
/// is gone. Role objects must not keep the upgraded stack alive beyond a
/// call.
#[derive(Clone)]
pub struct StackHandle(Weak<StackShared>);

impl std::fmt::Debug for StackHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("StackHandle")
			.field(&if self.is_released() { "released" } else { "live" })
			.finish()
	}
}

macro_rules! sibling_accessor {
	($(#[$meta:meta])* $name:ident, $field:ident, $role_trait:ident, $role:expr) => {
		$(#[$meta])*
		pub fn $name<R>(&self, f: impl FnOnce(&dyn $role_trait) -> Result<R>) -> Result<R> {
			let shared = self.upgrade()?;
			let role = shared.$field.as_deref().ok_or(KernelError::MissingRole($role))?;
			f(role)
		}
	};
}

impl StackHandle {
	fn upgrade(&self) -> Result<Arc<StackShared>> {
		self.0.upgrade().ok_or(KernelError::StackReleased)
	}

	pub fn is_released(&self) -> bool {
		self.0.strong_count() == 0
	}

	pub fn get(&self, key: &str) -> Result<StackValue> {
		self.upgrade()?.get(key)
	}

	pub fn set(&self, key: impl Into<String>, value: impl Into<StackValue>) -> Result<()> {
		self.upgrade()?.values.lock().insert(key.into(), value.into());
		Ok(())
	}

	pub fn contains(&self, key: &str) -> Result<bool> {
		Ok(self.upgrade()?.values.lock().contains_key(key))
	}

	pub fn erase(&self, key: &str) -> Result<()> {
		self.upgrade()?.values.lock().remove(key);
		Ok(())
	}

	pub fn security_context(&self) -> Result<Arc<SecurityContext>> {
		self.upgrade()?.security_context()
	}

	sibling_accessor!(
		/// Runs `f` against the stack's authn.
		with_authn, authn, Authn, Role::Authn
	);
	sibling_accessor!(with_inode, inode, INode, Role::INode);
	sibling_accessor!(
		/// Runs `f` against the stack's catalog, typically from an inode or
		/// pool driver needing path resolution.
		with_catalog, catalog, Catalog, Role::Catalog
	);
	sibling_accessor!(with_pool_manager, pool_manager, PoolManager, Role::PoolManager);
	sibling_accessor!(with_io_driver, io_driver, IODriver, Role::IODriver);
}

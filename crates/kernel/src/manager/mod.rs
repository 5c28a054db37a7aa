//! Factory registry and plugin loading.

mod config;


use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::builtin::BuiltinAuthnFactory;
use crate::error::{ErrorKind, KernelError, Result, Role, catch_panic};
use crate::factory::{
	AuthnFactory, BaseFactory, CatalogFactory, INodeFactory, IODriverFactory, PoolDriverFactory,
	PoolManagerFactory,
};
use crate::plugin::{API_VERSION, DylibLoader, PluginLoader};

/// Registry of factories, one stack per role.
///
/// The most recently registered factory of a role is its top and is the one
/// stacks instantiate; earlier ones stay registered so decorators can wrap
/// them and so they keep receiving configuration. Configure the manager
/// single-threaded at startup, then share it as `Arc<PluginManager>`.
pub struct PluginManager {
	authn: Vec<Arc<dyn AuthnFactory>>,
	inode: Vec<Arc<dyn INodeFactory>>,
	catalog: Vec<Arc<dyn CatalogFactory>>,
	pool_manager: Vec<Arc<dyn PoolManagerFactory>>,
	io_driver: Vec<Arc<dyn IODriverFactory>>,
	pool_driver: Vec<Arc<dyn PoolDriverFactory>>,
	/// Every registered factory once, in registration order.
	configurables: Vec<Arc<dyn BaseFactory>>,
	conf_values: FxHashMap<String, String>,
	// Must drop after the factories: their code may live in these libraries.
	loader: Box<dyn PluginLoader>,
}

impl Default for PluginManager {
	fn default() -> Self {
		Self::new()
	}
}

impl PluginManager {
	/// An empty manager loading plugins from shared libraries.
	pub fn new() -> Self {
		Self {
			authn: Vec::new(),
			inode: Vec::new(),
			catalog: Vec::new(),
			pool_manager: Vec::new(),
			io_driver: Vec::new(),
			pool_driver: Vec::new(),
			configurables: Vec::new(),
			conf_values: FxHashMap::default(),
			loader: Box::new(DylibLoader::new()),
		}
	}

	/// A manager with the system-account authn registered.
	pub fn with_builtins() -> Self {
		let mut manager = Self::new();
		manager.register_authn_factory(Arc::new(BuiltinAuthnFactory));
		manager
	}

	/// Replaces the plugin loader.
	pub fn with_loader(mut self, loader: impl PluginLoader + 'static) -> Self {
		self.loader = Box::new(loader);
		self
	}

	/// Loads `symbol` from `library` and runs its registration.
	pub fn load_plugin(&mut self, library: impl AsRef<Path>, symbol: &str) -> Result<()> {
		let library = library.as_ref();
		tracing::info!(library = %library.display(), symbol, "loading plugin");

		let card = self.loader.load(library, symbol)?;
		if card.api_version != API_VERSION {
			return Err(KernelError::ApiVersionMismatch {
				library: library.to_path_buf(),
				plugin: card.api_version,
				core: API_VERSION,
			});
		}

		catch_panic(&format!("registration of {symbol}"), || (card.register_plugin)(self))
	}

	pub fn register_authn_factory(&mut self, factory: Arc<dyn AuthnFactory>) {
		self.track(factory.clone());
		self.authn.push(factory);
	}

	pub fn register_inode_factory(&mut self, factory: Arc<dyn INodeFactory>) {
		self.track(factory.clone());
		self.inode.push(factory);
	}

	pub fn register_catalog_factory(&mut self, factory: Arc<dyn CatalogFactory>) {
		self.track(factory.clone());
		self.catalog.push(factory);
	}

	pub fn register_pool_manager_factory(&mut self, factory: Arc<dyn PoolManagerFactory>) {
		self.track(factory.clone());
		self.pool_manager.push(factory);
	}

	pub fn register_io_driver_factory(&mut self, factory: Arc<dyn IODriverFactory>) {
		self.track(factory.clone());
		self.io_driver.push(factory);
	}

	pub fn register_pool_driver_factory(&mut self, factory: Arc<dyn PoolDriverFactory>) {
		self.track(factory.clone());
		self.pool_driver.push(factory);
	}

	/// Registers a factory that only takes part in configuration.
	pub fn register_configure_factory(&mut self, factory: Arc<dyn BaseFactory>) {
		self.track(factory);
	}

	fn track(&mut self, factory: Arc<dyn BaseFactory>) {
		let id = Arc::as_ptr(&factory).cast::<()>();
		if !self.configurables.iter().any(|f| Arc::as_ptr(f).cast::<()>() == id) {
			self.configurables.push(factory);
		}
	}

	pub fn authn_factory(&self) -> Result<Arc<dyn AuthnFactory>> {
		top(&self.authn, Role::Authn)
	}

	pub fn inode_factory(&self) -> Result<Arc<dyn INodeFactory>> {
		top(&self.inode, Role::INode)
	}

	pub fn catalog_factory(&self) -> Result<Arc<dyn CatalogFactory>> {
		top(&self.catalog, Role::Catalog)
	}

	pub fn pool_manager_factory(&self) -> Result<Arc<dyn PoolManagerFactory>> {
		top(&self.pool_manager, Role::PoolManager)
	}

	pub fn io_driver_factory(&self) -> Result<Arc<dyn IODriverFactory>> {
		top(&self.io_driver, Role::IODriver)
	}

	/// Most recently registered factory implementing `pool_type`.
	pub fn pool_driver_factory(&self, pool_type: &str) -> Result<Arc<dyn PoolDriverFactory>> {
		self.pool_driver
			.iter()
			.rev()
			.find(|f| f.implemented_pool() == pool_type)
			.cloned()
			.ok_or_else(|| KernelError::UnknownPoolType(pool_type.to_string()))
	}

	/// Broadcasts an option to every registered factory.
	///
	/// Factories answering [`UnknownOption`](ErrorKind::UnknownOption) are
	/// skipped; the first other error is returned. Fails with
	/// `UnknownOption` when no factory accepted the key.
	pub fn configure(&mut self, key: &str, value: &str) -> Result<()> {
		let mut accepted = 0usize;
		for factory in &self.configurables {
			match catch_panic(&format!("configuration of {key}"), || factory.configure(key, value)) {
				Ok(()) => accepted += 1,
				Err(err) if err.kind() == ErrorKind::UnknownOption => {}
				Err(err) => return Err(err),
			}
		}

		if accepted == 0 {
			return Err(KernelError::UnknownOption { key: key.to_string() });
		}
		tracing::debug!(key, value, accepted, "option configured");
		self.conf_values.insert(key.to_string(), value.to_string());
		Ok(())
	}

	/// Last accepted value of `key`.
	pub fn configuration(&self, key: &str) -> Result<&str> {
		self.conf_values
			.get(key)
			.map(String::as_str)
			.ok_or_else(|| KernelError::UnknownKey(key.to_string()))
	}
}

fn top<F: ?Sized>(factories: &[Arc<F>], role: Role) -> Result<Arc<F>> {
	factories.last().cloned().ok_or(KernelError::NoFactory { role })
}

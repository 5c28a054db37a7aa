//! Catalog decorator that times every call.
//!
//! Load it after the catalog it should wrap:
//!
//! ```text
//! LoadPlugin plugin_mysql    /usr/lib/catena/libcatena_mysql.so
//! LoadPlugin plugin_profiler /usr/lib/catena/libcatena_profiler.so
//! ProfilerThresholdMs 250
//! ```
//!
//! Calls are logged at `debug`; calls slower than `ProfilerThresholdMs` are
//! logged at `warn`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use catena_kernel::security::{Acl, SecurityContext};
use catena_kernel::{
	BaseFactory, BaseInterface, Catalog, CatalogFactory, ExtendedStat, KernelError, PluginIdCard,
	PluginManager, Replica, Result, StackHandle, options,
};
use parking_lot::RwLock;
#[cfg(test)]
use {pretty_assertions as _, tracing_subscriber as _};

/// Option setting the slow-call threshold, in milliseconds. `0` disables it.
pub const THRESHOLD_OPTION: &str = "ProfilerThresholdMs";

#[unsafe(no_mangle)]
#[allow(non_upper_case_globals)]
pub static plugin_profiler: PluginIdCard = PluginIdCard::new(register);

/// Wraps the current top catalog factory.
pub fn register(manager: &mut PluginManager) -> Result<()> {
	let nested = manager.catalog_factory()?;
	manager.register_catalog_factory(Arc::new(ProfilerCatalogFactory::new(nested)));
	tracing::debug!("catalog profiler registered");
	Ok(())
}

pub struct ProfilerCatalogFactory {
	nested: Arc<dyn CatalogFactory>,
	threshold: RwLock<Option<Duration>>,
}

impl ProfilerCatalogFactory {
	pub fn new(nested: Arc<dyn CatalogFactory>) -> Self {
		Self {
			nested,
			threshold: RwLock::new(None),
		}
	}
}

impl BaseFactory for ProfilerCatalogFactory {
	// Options reach the nested factory through its own registration.
	fn configure(&self, key: &str, value: &str) -> Result<()> {
		if key != THRESHOLD_OPTION {
			return Err(KernelError::UnknownOption { key: key.to_string() });
		}
		let threshold = options::parse_duration_ms(key, value)?;
		*self.threshold.write() = (!threshold.is_zero()).then_some(threshold);
		Ok(())
	}
}

impl CatalogFactory for ProfilerCatalogFactory {
	fn create_catalog(&self, manager: &PluginManager) -> Result<Box<dyn Catalog>> {
		Ok(Box::new(ProfilerCatalog {
			inner: self.nested.create_catalog(manager)?,
			threshold: *self.threshold.read(),
		}))
	}
}

pub struct ProfilerCatalog {
	inner: Box<dyn Catalog>,
	threshold: Option<Duration>,
}

impl ProfilerCatalog {
	fn timed<T>(&self, operation: &'static str, call: impl FnOnce(&dyn Catalog) -> Result<T>) -> Result<T> {
		let start = Instant::now();
		let result = call(self.inner.as_ref());
		let elapsed = start.elapsed();

		let inner = self.inner.impl_id();
		let elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
		let ok = result.is_ok();
		match self.threshold {
			Some(threshold) if elapsed >= threshold => {
				tracing::warn!(operation, inner, elapsed_us, ok, "slow catalog call");
			}
			_ => tracing::debug!(operation, inner, elapsed_us, ok, "catalog call"),
		}
		result
	}
}

impl BaseInterface for ProfilerCatalog {
	fn impl_id(&self) -> &str {
		"ProfilerCatalog"
	}

	fn set_stack_instance(&self, stack: StackHandle) -> Result<()> {
		self.inner.set_stack_instance(stack)
	}

	fn set_security_context(&self, context: Arc<SecurityContext>) -> Result<()> {
		self.inner.set_security_context(context)
	}
}

impl Catalog for ProfilerCatalog {
	fn extended_stat(&self, path: &str, follow_symlinks: bool) -> Result<ExtendedStat> {
		self.timed("extended_stat", |c| c.extended_stat(path, follow_symlinks))
	}

	fn access(&self, path: &str, mode: u32) -> Result<bool> {
		self.timed("access", |c| c.access(path, mode))
	}

	fn make_dir(&self, path: &str, mode: u32) -> Result<()> {
		self.timed("make_dir", |c| c.make_dir(path, mode))
	}

	fn create(&self, path: &str, mode: u32) -> Result<()> {
		self.timed("create", |c| c.create(path, mode))
	}

	fn unlink(&self, path: &str) -> Result<()> {
		self.timed("unlink", |c| c.unlink(path))
	}

	fn remove_dir(&self, path: &str) -> Result<()> {
		self.timed("remove_dir", |c| c.remove_dir(path))
	}

	fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
		self.timed("rename", |c| c.rename(old_path, new_path))
	}

	fn set_mode(&self, path: &str, mode: u32) -> Result<()> {
		self.timed("set_mode", |c| c.set_mode(path, mode))
	}

	fn set_owner(&self, path: &str, uid: u32, gid: u32, follow_symlinks: bool) -> Result<()> {
		self.timed("set_owner", |c| c.set_owner(path, uid, gid, follow_symlinks))
	}

	fn set_acl(&self, path: &str, acl: &Acl) -> Result<()> {
		self.timed("set_acl", |c| c.set_acl(path, acl))
	}

	fn replicas(&self, path: &str) -> Result<Vec<Replica>> {
		self.timed("replicas", |c| c.replicas(path))
	}

	fn add_replica(&self, replica: &Replica) -> Result<()> {
		self.timed("add_replica", |c| c.add_replica(replica))
	}

	fn delete_replica(&self, replica: &Replica) -> Result<()> {
		self.timed("delete_replica", |c| c.delete_replica(replica))
	}
}

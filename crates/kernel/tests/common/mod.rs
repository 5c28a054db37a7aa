#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use catena_kernel::security::{Acl, FileStat, S_IFDIR, S_IFREG};
use catena_kernel::{
	BaseFactory, BaseInterface, Catalog, CatalogFactory, ExtendedStat, KernelError, PluginIdCard,
	PluginManager, Result, SecurityCell, StaticLoader, options,
};
use parking_lot::{Mutex, RwLock};
// Every test binary links the full dependency set of the kernel.
use {
	bitflags as _, catena_pool as _, catena_security as _, libloading as _, nix as _, rstest as _,
	rustc_hash as _, serde as _, tempfile as _, thiserror as _,
};

pub const MEMORY_LIBRARY: &str = "libcatena_memory.so";

/// Routes kernel logs to the test harness output.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

pub fn loader() -> StaticLoader {
	StaticLoader::new()
		.with_plugin(MEMORY_LIBRARY, "plugin_memory", PluginIdCard::new(register_memory))
		.with_plugin(MEMORY_LIBRARY, "plugin_shadow", PluginIdCard::new(register_shadow))
}

fn register_memory(manager: &mut PluginManager) -> Result<()> {
	manager.register_catalog_factory(Arc::new(MemoryCatalogFactory::default()));
	Ok(())
}

fn register_shadow(manager: &mut PluginManager) -> Result<()> {
	manager.register_catalog_factory(Arc::new(ShadowCatalogFactory));
	Ok(())
}

#[derive(Default)]
pub struct MemoryCatalogFactory {
	root_mode: RwLock<Option<u32>>,
}

impl BaseFactory for MemoryCatalogFactory {
	fn configure(&self, key: &str, value: &str) -> Result<()> {
		match key {
			"MemoryRootMode" => {
				let mode = u32::from_str_radix(value, 8).map_err(|e| KernelError::invalid_option(key, value, e))?;
				*self.root_mode.write() = Some(mode);
				Ok(())
			}
			"MemoryCapacity" => options::parse_u64(key, value).map(drop),
			_ => Err(KernelError::UnknownOption { key: key.to_string() }),
		}
	}
}

impl CatalogFactory for MemoryCatalogFactory {
	fn create_catalog(&self, _: &PluginManager) -> Result<Box<dyn Catalog>> {
		let mode = self.root_mode.read().unwrap_or(0o755);
		let mut files = BTreeMap::new();
		files.insert(
			"/".to_string(),
			ExtendedStat {
				stat: FileStat {
					ino: 1,
					mode: S_IFDIR | mode,
					nlink: 1,
					..FileStat::default()
				},
				name: "/".to_string(),
				..ExtendedStat::default()
			},
		);
		Ok(Box::new(MemoryCatalog {
			security: SecurityCell::new(),
			files: Mutex::new(files),
		}))
	}
}

/// Flat in-memory namespace checking permissions against the stack's context.
pub struct MemoryCatalog {
	security: SecurityCell,
	files: Mutex<BTreeMap<String, ExtendedStat>>,
}

impl MemoryCatalog {
	fn lookup(&self, path: &str) -> Result<ExtendedStat> {
		self.files.lock().get(path).cloned().ok_or_else(|| KernelError::Io {
			context: path.to_string(),
			source: std::io::ErrorKind::NotFound.into(),
		})
	}
}

impl BaseInterface for MemoryCatalog {
	fn impl_id(&self) -> &str {
		"MemoryCatalog"
	}

	fn set_security_context(&self, context: Arc<catena_kernel::security::SecurityContext>) -> Result<()> {
		self.security.set(context);
		Ok(())
	}
}

impl Catalog for MemoryCatalog {
	fn extended_stat(&self, path: &str, _follow_symlinks: bool) -> Result<ExtendedStat> {
		self.lookup(path)
	}

	fn access(&self, path: &str, mode: u32) -> Result<bool> {
		let context = self.security.get()?;
		let entry = self.lookup(path)?;
		Ok(context.check(&entry.acl, &entry.stat, mode).is_allowed())
	}

	fn create(&self, path: &str, mode: u32) -> Result<()> {
		let context = self.security.get()?;
		let mut files = self.files.lock();
		let ino = files.len() as u64 + 1;
		files.insert(
			path.to_string(),
			ExtendedStat {
				stat: FileStat {
					ino,
					mode: S_IFREG | (mode & 0o777),
					nlink: 1,
					uid: context.user().uid,
					gid: context.primary_group().gid,
					size: 0,
				},
				name: path.rsplit('/').next().unwrap_or(path).to_string(),
				..ExtendedStat::default()
			},
		);
		Ok(())
	}

	fn set_acl(&self, path: &str, acl: &Acl) -> Result<()> {
		acl.validate()?;
		let mut files = self.files.lock();
		let entry = files.get_mut(path).ok_or_else(|| KernelError::Io {
			context: path.to_string(),
			source: std::io::ErrorKind::NotFound.into(),
		})?;
		entry.acl = acl.serialize();
		Ok(())
	}
}

/// A second catalog plugin, used to check which factory ends up on top.
pub struct ShadowCatalogFactory;

impl BaseFactory for ShadowCatalogFactory {}

impl CatalogFactory for ShadowCatalogFactory {
	fn create_catalog(&self, _: &PluginManager) -> Result<Box<dyn Catalog>> {
		Ok(Box::new(ShadowCatalog))
	}
}

pub struct ShadowCatalog;

impl BaseInterface for ShadowCatalog {
	fn impl_id(&self) -> &str {
		"ShadowCatalog"
	}
}

impl Catalog for ShadowCatalog {}

//! Plugin ABI and the loaders resolving it.
//!
//! A plugin library exports a `static` [`PluginIdCard`] under a symbol
//! named in the configuration:
//!
//! ```rust,ignore
//! #[unsafe(no_mangle)]
//! #[allow(non_upper_case_globals)]
//! pub static plugin_memory: PluginIdCard = PluginIdCard::new(register);
//!
//! fn register(manager: &mut PluginManager) -> Result<()> {
//!     manager.register_catalog_factory(Arc::new(MemoryFactory::default()));
//!     Ok(())
//! }
//! ```
//!
//! The card holds a Rust function pointer, so plugins must be built with the
//! same toolchain and `catena-kernel` version as the host.

use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use rustc_hash::FxHashMap;

use crate::error::{KernelError, Result};
use crate::manager::PluginManager;

/// Version of the plugin ABI. Bump on any change to the role or factory
/// traits.
pub const API_VERSION: u32 = 3;

/// Registration entry point of a plugin.
pub type RegisterFn = fn(&mut PluginManager) -> Result<()>;

/// What a plugin library exports.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PluginIdCard {
	pub api_version: u32,
	pub register_plugin: RegisterFn,
}

impl PluginIdCard {
	/// A card for the running [`API_VERSION`].
	pub const fn new(register_plugin: RegisterFn) -> Self {
		Self {
			api_version: API_VERSION,
			register_plugin,
		}
	}
}

impl std::fmt::Debug for PluginIdCard {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PluginIdCard")
			.field("api_version", &self.api_version)
			.finish_non_exhaustive()
	}
}

/// Resolves `(library, symbol)` pairs to plugin cards.
pub trait PluginLoader: Send + Sync {
	fn load(&mut self, library: &Path, symbol: &str) -> Result<PluginIdCard>;
}

/// Loads plugins from shared libraries.
///
/// Libraries stay mapped for the lifetime of the loader, since factories
/// registered by a plugin point into its code.
#[derive(Default)]
pub struct DylibLoader {
	libraries: Vec<Library>,
}

impl DylibLoader {
	pub fn new() -> Self {
		Self::default()
	}
}

impl PluginLoader for DylibLoader {
	fn load(&mut self, library: &Path, symbol: &str) -> Result<PluginIdCard> {
		// SAFETY: loading runs the library's initializers; plugins are
		// trusted code named by the administrator's configuration.
		let lib = unsafe { Library::new(library) }.map_err(|e| KernelError::NoSuchFile {
			path: library.to_path_buf(),
			reason: e.to_string(),
		})?;

		// SAFETY: the symbol is a `static PluginIdCard` by contract; the card
		// is copied out before the `Symbol` borrow ends.
		let card = unsafe {
			let sym: Symbol<'_, *const PluginIdCard> =
				lib.get(symbol.as_bytes()).map_err(|e| KernelError::NoSuchSymbol {
					library: library.to_path_buf(),
					symbol: symbol.to_string(),
					reason: e.to_string(),
				})?;
			**sym
		};

		self.libraries.push(lib);
		Ok(card)
	}
}

/// Serves cards linked into the binary.
///
/// Used for statically linked deployments and in tests, where the library
/// path is only a name.
#[derive(Default, Clone)]
pub struct StaticLoader {
	libraries: FxHashMap<PathBuf, FxHashMap<String, PluginIdCard>>,
}

impl StaticLoader {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes `card` resolvable as `symbol` inside `library`.
	pub fn with_plugin(mut self, library: impl Into<PathBuf>, symbol: impl Into<String>, card: PluginIdCard) -> Self {
		self.libraries
			.entry(library.into())
			.or_default()
			.insert(symbol.into(), card);
		self
	}
}

impl PluginLoader for StaticLoader {
	fn load(&mut self, library: &Path, symbol: &str) -> Result<PluginIdCard> {
		let symbols = self.libraries.get(library).ok_or_else(|| KernelError::NoSuchFile {
			path: library.to_path_buf(),
			reason: "not linked into this binary".to_string(),
		})?;
		symbols.get(symbol).copied().ok_or_else(|| KernelError::NoSuchSymbol {
			library: library.to_path_buf(),
			symbol: symbol.to_string(),
			reason: "not exported".to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;

	fn noop(_: &mut PluginManager) -> Result<()> {
		Ok(())
	}

	#[test]
	fn dylib_loader_reports_missing_library() {
		let err = DylibLoader::new()
			.load(Path::new("/nonexistent/libcatena_missing.so"), "plugin_missing")
			.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::NoSuchFile);
	}

	#[test]
	fn static_loader_distinguishes_library_and_symbol() {
		let mut loader = StaticLoader::new().with_plugin("libmem.so", "plugin_mem", PluginIdCard::new(noop));

		assert!(loader.load(Path::new("libmem.so"), "plugin_mem").is_ok());
		assert_eq!(
			loader.load(Path::new("libmem.so"), "plugin_other").unwrap_err().kind(),
			ErrorKind::NoSuchSymbol
		);
		assert_eq!(
			loader.load(Path::new("libother.so"), "plugin_mem").unwrap_err().kind(),
			ErrorKind::NoSuchFile
		);
	}
}

mod common;

use std::sync::Arc;

use catena_kernel::{API_VERSION, ErrorKind, PluginIdCard, PluginManager, Result, StaticLoader};
use pretty_assertions::assert_eq;

fn top_catalog_id(manager: &PluginManager) -> String {
	let factory = manager.catalog_factory().ok().expect("a catalog factory");
	let catalog = factory.create_catalog(manager).expect("catalog creation");
	catalog.impl_id().to_string()
}

#[test]
fn loaded_plugin_registers_its_factory() {
	common::init_tracing();
	let mut manager = PluginManager::new().with_loader(common::loader());

	manager.load_plugin(common::MEMORY_LIBRARY, "plugin_memory").unwrap();

	assert_eq!(top_catalog_id(&manager), "MemoryCatalog");
}

#[test]
fn later_plugin_takes_the_top() {
	let mut manager = PluginManager::new().with_loader(common::loader());
	manager.load_plugin(common::MEMORY_LIBRARY, "plugin_memory").unwrap();
	manager.load_plugin(common::MEMORY_LIBRARY, "plugin_shadow").unwrap();

	assert_eq!(top_catalog_id(&manager), "ShadowCatalog");
}

#[test]
fn missing_library_and_symbol() {
	let mut manager = PluginManager::new().with_loader(common::loader());

	let err = manager.load_plugin("libnothing.so", "plugin_memory").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NoSuchFile);

	let err = manager.load_plugin(common::MEMORY_LIBRARY, "plugin_nothing").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NoSuchSymbol);
	assert!(manager.catalog_factory().is_err());
}

#[test]
fn dynamic_loader_reports_missing_library() {
	let mut manager = PluginManager::new();
	let err = manager
		.load_plugin("/nonexistent/libcatena_plugin.so", "plugin_x")
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NoSuchFile);
}

fn register_nothing(_: &mut PluginManager) -> Result<()> {
	Ok(())
}

#[test]
fn newer_plugin_asks_for_a_core_upgrade() {
	let card = PluginIdCard {
		api_version: API_VERSION + 1,
		register_plugin: register_nothing,
	};
	let mut manager = PluginManager::new().with_loader(StaticLoader::new().with_plugin("libnext.so", "plugin_next", card));

	let err = manager.load_plugin("libnext.so", "plugin_next").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ApiVersionMismatch);
	assert!(err.to_string().contains("libnext.so"));
	assert!(err.to_string().contains("upgrade the core or downgrade the plugin"));
}

fn register_panicking(_: &mut PluginManager) -> Result<()> {
	panic!("plugin initialisation went wrong")
}

#[test]
fn panicking_registration_is_contained() {
	let loader = StaticLoader::new().with_plugin("libbad.so", "plugin_bad", PluginIdCard::new(register_panicking));
	let mut manager = PluginManager::new().with_loader(loader);

	let err = manager.load_plugin("libbad.so", "plugin_bad").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::UnexpectedException);
	assert!(err.to_string().contains("plugin initialisation went wrong"));
}

#[test]
fn builtins_provide_an_authn() {
	let manager = Arc::new(PluginManager::with_builtins());
	let factory = manager.authn_factory().ok().expect("builtin authn");
	assert_eq!(factory.create_authn(&manager).unwrap().impl_id(), "BuiltinAuthn");
}

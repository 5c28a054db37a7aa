use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use catena_kernel::security::{SecurityContext, SecurityCredentials, UserInfo};
use catena_kernel::{
	BaseFactory, BaseInterface, Catalog, CatalogFactory, ErrorKind, ExtendedStat, PluginIdCard,
	PluginManager, Result, StackHandle, StackInstance, StaticLoader,
};
use pretty_assertions::assert_eq;
use {parking_lot as _, tracing as _};

/// Counts what reaches the base catalog, across every stack.
#[derive(Default)]
struct Calls {
	stat: AtomicUsize,
	stack: AtomicUsize,
	context: AtomicUsize,
}

struct CountingCatalog(Arc<Calls>);

impl BaseInterface for CountingCatalog {
	fn impl_id(&self) -> &str {
		"CountingCatalog"
	}

	fn set_stack_instance(&self, _stack: StackHandle) -> Result<()> {
		self.0.stack.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	fn set_security_context(&self, _context: Arc<SecurityContext>) -> Result<()> {
		self.0.context.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

impl Catalog for CountingCatalog {
	fn extended_stat(&self, path: &str, _follow: bool) -> Result<ExtendedStat> {
		self.0.stat.fetch_add(1, Ordering::SeqCst);
		Ok(ExtendedStat {
			name: path.to_string(),
			..ExtendedStat::default()
		})
	}
}

struct CountingFactory(Arc<Calls>);

impl BaseFactory for CountingFactory {}

impl CatalogFactory for CountingFactory {
	fn create_catalog(&self, _: &PluginManager) -> Result<Box<dyn Catalog>> {
		Ok(Box::new(CountingCatalog(self.0.clone())))
	}
}

fn manager_with_profiler(calls: &Arc<Calls>) -> PluginManager {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();

	let loader = StaticLoader::new().with_plugin(
		"libcatena_profiler.so",
		"plugin_profiler",
		catena_profiler::plugin_profiler,
	);
	let mut manager = PluginManager::new().with_loader(loader);
	manager.register_catalog_factory(Arc::new(CountingFactory(calls.clone())));
	manager.load_plugin("libcatena_profiler.so", "plugin_profiler").unwrap();
	manager
}

fn context() -> SecurityContext {
	SecurityContext::new(SecurityCredentials::new("ID", "alice"), UserInfo::new(1000, "alice"), vec![])
}

#[test]
fn decorator_wraps_the_base_catalog() {
	let calls = Arc::new(Calls::default());
	let mut stack = StackInstance::new(Arc::new(manager_with_profiler(&calls))).unwrap();
	stack.set_security_context(context()).unwrap();

	let catalog = stack.catalog().unwrap();
	assert_eq!(catalog.impl_id(), "ProfilerCatalog");

	let stat = catalog.extended_stat("/dteam/data", true).unwrap();
	assert_eq!(stat.name, "/dteam/data");
	assert_eq!(calls.stat.load(Ordering::SeqCst), 1);
}

#[test]
fn notifications_are_forwarded() {
	let calls = Arc::new(Calls::default());
	let mut stack = StackInstance::new(Arc::new(manager_with_profiler(&calls))).unwrap();
	assert_eq!(calls.stack.load(Ordering::SeqCst), 1);

	stack.set_security_context(context()).unwrap();
	stack.set_security_context(context()).unwrap();
	assert_eq!(calls.context.load(Ordering::SeqCst), 2);
}

#[test]
fn unimplemented_operations_pass_through() {
	let calls = Arc::new(Calls::default());
	let mut stack = StackInstance::new(Arc::new(manager_with_profiler(&calls))).unwrap();
	stack.set_security_context(context()).unwrap();

	let err = stack.catalog().unwrap().unlink("/x").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotImplemented);
	assert!(err.to_string().contains("CountingCatalog"));
}

#[test]
fn threshold_option_is_validated() {
	let calls = Arc::new(Calls::default());
	let mut manager = manager_with_profiler(&calls);

	manager.configure(catena_profiler::THRESHOLD_OPTION, "5").unwrap();
	assert_eq!(manager.configuration("ProfilerThresholdMs").unwrap(), "5");

	let err = manager.configure(catena_profiler::THRESHOLD_OPTION, "soon").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::InvalidOption);
}

#[test]
fn profiler_needs_something_to_wrap() {
	let card: PluginIdCard = catena_profiler::plugin_profiler;
	let mut manager = PluginManager::new().with_loader(StaticLoader::new().with_plugin("libp.so", "plugin_profiler", card));

	let err = manager.load_plugin("libp.so", "plugin_profiler").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NoFactory);
}

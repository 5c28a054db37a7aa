mod common;

use std::io::Write;

use catena_kernel::{ErrorKind, KernelError, PluginManager};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
	let mut file = NamedTempFile::new().unwrap();
	file.write_all(contents.as_bytes()).unwrap();
	file.flush().unwrap();
	file
}

fn manager() -> PluginManager {
	PluginManager::new().with_loader(common::loader())
}

#[test]
fn loads_plugins_and_options() {
	common::init_tracing();
	let file = config_file(
		"# memory backend\n\
		 \n\
		 LoadPlugin plugin_memory libcatena_memory.so\n\
		 MemoryRootMode   0700\n\
		 MemoryCapacity 128\n",
	);
	let mut manager = manager();

	manager.load_configuration(file.path()).unwrap();

	assert_eq!(manager.configuration("MemoryRootMode").unwrap(), "0700");
	assert_eq!(manager.configuration("MemoryCapacity").unwrap(), "128");
	assert!(manager.catalog_factory().is_ok());
}

#[rstest]
#[case::unknown_option("LoadPlugin plugin_memory libcatena_memory.so\n\nColour blue\n", 3, ErrorKind::UnknownOption)]
#[case::invalid_value("LoadPlugin plugin_memory libcatena_memory.so\nMemoryCapacity lots\n", 2, ErrorKind::InvalidOption)]
#[case::missing_value("# header\nMemoryCapacity\n", 2, ErrorKind::MalformedConfig)]
#[case::short_load_plugin("LoadPlugin plugin_memory\n", 1, ErrorKind::MalformedConfig)]
#[case::missing_symbol("LoadPlugin plugin_none libcatena_memory.so\n", 1, ErrorKind::NoSuchSymbol)]
fn errors_carry_their_line(#[case] contents: &str, #[case] line: usize, #[case] kind: ErrorKind) {
	let file = config_file(contents);
	let err = manager().load_configuration(file.path()).unwrap_err();

	assert_eq!(err.kind(), kind);
	match &err {
		KernelError::AtLine { path, line: at, .. } => {
			assert_eq!(path, file.path());
			assert_eq!(*at, line);
		}
		other => panic!("expected a line error, got {other:?}"),
	}
	assert!(err.to_string().contains(&format!(":{line}: ")));
}

#[test]
fn failure_keeps_earlier_plugins_loaded() {
	let file = config_file("LoadPlugin plugin_memory libcatena_memory.so\nBogus 1\nLoadPlugin plugin_shadow libcatena_memory.so\n");
	let mut manager = manager();

	assert!(manager.load_configuration(file.path()).is_err());

	let factory = manager.catalog_factory().ok().expect("memory plugin stays registered");
	assert_eq!(factory.create_catalog(&manager).unwrap().impl_id(), "MemoryCatalog");
}

#[test]
fn missing_file_is_no_such_file() {
	let dir = tempfile::tempdir().unwrap();
	let err = manager()
		.load_configuration(dir.path().join("absent.conf"))
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NoSuchFile);
}

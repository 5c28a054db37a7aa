use catena_security::Acl;

use super::{BaseInterface, unsupported};
use crate::error::Result;
use crate::types::{ExtendedStat, Replica};

/// Path-based namespace operations.
pub trait Catalog: BaseInterface {
	fn extended_stat(&self, _path: &str, _follow_symlinks: bool) -> Result<ExtendedStat> {
		unsupported(self, "extended_stat")
	}

	/// Whether the current security context may access `path` with `mode`.
	fn access(&self, _path: &str, _mode: u32) -> Result<bool> {
		unsupported(self, "access")
	}

	fn make_dir(&self, _path: &str, _mode: u32) -> Result<()> {
		unsupported(self, "make_dir")
	}

	fn create(&self, _path: &str, _mode: u32) -> Result<()> {
		unsupported(self, "create")
	}

	fn unlink(&self, _path: &str) -> Result<()> {
		unsupported(self, "unlink")
	}

	fn remove_dir(&self, _path: &str) -> Result<()> {
		unsupported(self, "remove_dir")
	}

	fn rename(&self, _old_path: &str, _new_path: &str) -> Result<()> {
		unsupported(self, "rename")
	}

	fn set_mode(&self, _path: &str, _mode: u32) -> Result<()> {
		unsupported(self, "set_mode")
	}

	fn set_owner(&self, _path: &str, _uid: u32, _gid: u32, _follow_symlinks: bool) -> Result<()> {
		unsupported(self, "set_owner")
	}

	fn set_acl(&self, _path: &str, _acl: &Acl) -> Result<()> {
		unsupported(self, "set_acl")
	}

	fn replicas(&self, _path: &str) -> Result<Vec<Replica>> {
		unsupported(self, "replicas")
	}

	fn add_replica(&self, _replica: &Replica) -> Result<()> {
		unsupported(self, "add_replica")
	}

	fn delete_replica(&self, _replica: &Replica) -> Result<()> {
		unsupported(self, "delete_replica")
	}
}

use super::{BaseInterface, unsupported};
use crate::error::Result;
use crate::types::{ExtendedStat, Replica};

/// Inode-level metadata store with explicit transactions.
pub trait INode: BaseInterface {
	fn begin(&self) -> Result<()> {
		unsupported(self, "begin")
	}

	fn commit(&self) -> Result<()> {
		unsupported(self, "commit")
	}

	fn rollback(&self) -> Result<()> {
		unsupported(self, "rollback")
	}

	fn extended_stat(&self, _ino: u64) -> Result<ExtendedStat> {
		unsupported(self, "extended_stat")
	}

	fn extended_stat_by_name(&self, _parent: u64, _name: &str) -> Result<ExtendedStat> {
		unsupported(self, "extended_stat_by_name")
	}

	/// Inserts `entry` and returns it with its assigned inode number.
	fn create(&self, _entry: &ExtendedStat) -> Result<ExtendedStat> {
		unsupported(self, "create")
	}

	fn unlink(&self, _ino: u64) -> Result<()> {
		unsupported(self, "unlink")
	}

	fn replicas(&self, _ino: u64) -> Result<Vec<Replica>> {
		unsupported(self, "replicas")
	}
}

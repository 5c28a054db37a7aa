//! Value types exchanged through the role contracts.

use catena_security::FileStat;
use serde::{Deserialize, Serialize};

/// Namespace entry as catalogs and inode stores return it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedStat {
	pub stat: FileStat,
	pub parent: u64,
	pub name: String,
	pub guid: String,
	pub status: FileStatus,
	pub checksum_type: String,
	pub checksum_value: String,
	/// Serialized ACL, empty for plain mode bits.
	pub acl: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
	#[default]
	Online,
	Migrated,
}

/// A physical copy of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replica {
	pub replica_id: i64,
	pub file_id: u64,
	pub server: String,
	/// Replica file name, the physical location.
	pub rfn: String,
	pub pool: String,
	pub status: ReplicaStatus,
	pub kind: ReplicaKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicaStatus {
	#[default]
	Available,
	BeingPopulated,
	ToBeDeleted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicaKind {
	Volatile,
	#[default]
	Permanent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pool {
	pub name: String,
	/// Selects the pool driver, see [`PoolDriverFactory::implemented_pool`](crate::PoolDriverFactory::implemented_pool).
	pub pool_type: String,
}

/// Filter for [`PoolManager::pools`](crate::PoolManager::pools).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoolAvailability {
	#[default]
	Any,
	None,
	ForRead,
	ForWrite,
	ForBoth,
}

/// One contiguous piece of a file on a disk server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
	pub host: String,
	pub path: String,
	pub offset: u64,
	pub size: u64,
}

/// Where to read or write a file, chunk by chunk.
pub type Location = Vec<Chunk>;

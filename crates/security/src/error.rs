//! Error types for ACL parsing and validation.

use thiserror::Error;

/// Errors raised while parsing or validating an [`Acl`](crate::Acl).
///
/// Permission evaluation itself never fails; only the textual form can be
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AclError {
	/// An entry does not follow `<TypeChar><PermDigit><Id>`.
	#[error("malformed ACL entry '{entry}' at position {position}")]
	Malformed {
		/// The offending entry text.
		entry: String,
		/// Zero-based index of the entry in the serialized list.
		position: usize,
	},

	/// A permission value outside `0..=7`.
	#[error("invalid permission {perm} in ACL entry {entry}")]
	InvalidPermission {
		/// The serialized entry.
		entry: String,
		/// The rejected permission value.
		perm: u8,
	},

	/// The same `(type, id)` pair appears twice.
	#[error("duplicated ACL entry {0}")]
	Duplicate(String),

	/// Entries are not in ascending `(type, id)` order.
	#[error("ACL entries are not sorted by type and id (at {0})")]
	Unsorted(String),

	/// Required entries are missing or repeated.
	#[error("{0}")]
	Structure(&'static str),
}

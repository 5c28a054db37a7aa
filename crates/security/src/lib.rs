//! Security contexts and the POSIX-like permission engine.
//!
//! Everything here is pure: credentials and resolved identities go in,
//! an [`Access`] decision comes out. Resolving credentials against a user
//! database is the job of an `Authn` implementation in `catena-kernel`.

mod acl;
mod context;
mod error;
mod permissions;

pub use acl::{Acl, AclEntry, AclTag};
pub use context::{GroupInfo, SecurityContext, SecurityCredentials, UserInfo, vo_from_role};
pub use error::AclError;
pub use permissions::{
	Access, FileStat, S_IEXEC, S_IFDIR, S_IFMT, S_IFREG, S_IREAD, S_IWRITE, check_acl_permissions,
	check_permissions, has_group,
};

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, AclError>;

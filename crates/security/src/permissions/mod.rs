//! Permission evaluation over mode bits and ACLs.


use serde::{Deserialize, Serialize};

use crate::acl::{Acl, AclTag};
use crate::context::{GroupInfo, UserInfo};

pub const S_IFMT: u32 = 0o170000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;

/// Read permission, owner position.
pub const S_IREAD: u32 = 0o400;
/// Write permission, owner position.
pub const S_IWRITE: u32 = 0o200;
/// Execute/search permission, owner position.
pub const S_IEXEC: u32 = 0o100;

const ROOT_UID: u32 = 0;

/// The stat fields the permission engine and catalogs exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
	pub ino: u64,
	/// File type and permission bits.
	pub mode: u32,
	pub nlink: u32,
	pub uid: u32,
	pub gid: u32,
	pub size: u64,
}

impl FileStat {
	pub fn is_dir(&self) -> bool {
		self.mode & S_IFMT == S_IFDIR
	}
}

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
	Allowed,
	Denied,
}

impl Access {
	pub fn is_allowed(self) -> bool {
		self == Access::Allowed
	}

	fn covering(granted: u32, wanted: u32) -> Self {
		if granted & wanted == wanted { Access::Allowed } else { Access::Denied }
	}
}

/// Non-banned membership test.
pub fn has_group(groups: &[GroupInfo], gid: u32) -> bool {
	groups.iter().any(|g| !g.banned && g.gid == gid)
}

/// Checks `requested` (owner-position bits) against a serialized ACL.
///
/// An ACL that cannot be parsed denies access.
pub fn check_permissions(
	user: &UserInfo,
	primary: &GroupInfo,
	secondary: &[GroupInfo],
	acl: &str,
	stat: &FileStat,
	requested: u32,
) -> Access {
	match Acl::deserialize(acl) {
		Ok(acl) => check_acl_permissions(user, primary, secondary, &acl, stat, requested),
		Err(err) => {
			tracing::warn!(error = %err, "denying access on malformed ACL");
			Access::Denied
		}
	}
}

/// [`check_permissions`] over an already parsed ACL.
pub fn check_acl_permissions(
	user: &UserInfo,
	primary: &GroupInfo,
	secondary: &[GroupInfo],
	acl: &Acl,
	stat: &FileStat,
	requested: u32,
) -> Access {
	let decision = evaluate(user, primary, secondary, acl, stat, requested & 0o700);
	tracing::trace!(
		uid = user.uid,
		ino = stat.ino,
		requested = format_args!("{:o}", requested),
		?decision,
		"permission check"
	);
	decision
}

fn evaluate(user: &UserInfo, primary: &GroupInfo, secondary: &[GroupInfo], acl: &Acl, stat: &FileStat, requested: u32) -> Access {
	let member_of = |gid: u32| (!primary.banned && primary.gid == gid) || has_group(secondary, gid);

	if user.banned {
		return Access::Denied;
	}
	if user.uid == ROOT_UID {
		return Access::Allowed;
	}
	if user.uid == stat.uid {
		return Access::covering(stat.mode, requested);
	}

	if acl.is_empty() {
		let shift = if member_of(stat.gid) { 3 } else { 6 };
		return Access::covering(stat.mode, requested >> shift);
	}

	let wanted = requested >> 6;
	let live = |tag: AclTag| acl.iter().filter(move |e| !e.default && e.tag == tag);
	let mask = live(AclTag::Mask).next().map(|e| u32::from(e.perm));
	let mask_bits = mask.unwrap_or(0o7);

	if let Some(entry) = live(AclTag::User).find(|e| e.id == user.uid) {
		return Access::covering(u32::from(entry.perm) & mask_bits, wanted);
	}

	let mut granted = 0;
	let mut matched = false;
	if member_of(stat.gid) {
		granted = live(AclTag::GroupObj)
			.next()
			.map_or((stat.mode >> 3) & 0o7, |e| u32::from(e.perm));
		if mask.is_none() {
			return Access::covering(granted, wanted);
		}
		matched = true;
	}
	for entry in live(AclTag::Group).filter(|e| member_of(e.id)) {
		granted |= u32::from(entry.perm);
		matched = true;
	}
	if matched {
		return Access::covering(granted & mask_bits, wanted);
	}

	let other = live(AclTag::Other)
		.next()
		.map_or(stat.mode & 0o7, |e| u32::from(e.perm));
	Access::covering(other, wanted)
}

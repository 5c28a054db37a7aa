use super::{Acl, AclEntry, AclTag};
use crate::permissions::{S_IFDIR, S_IFMT};

/// Overwrites the 3-bit class of `mode` starting at `shift`.
fn set_class(mode: &mut u32, shift: u32, perm: u8) {
	*mode = (*mode & !(0o7 << shift)) | (u32::from(perm) << shift);
}

fn class_of(mode: u32, shift: u32) -> u8 {
	((mode >> shift) & 0o7) as u8
}

impl Acl {
	/// Derives the ACL of a new child of `parent`.
	///
	/// `creation_mode` is the mode requested by the caller and `file_mode`
	/// the mode about to be stored; its permission classes are rewritten from
	/// the parent's default entries. Live entries are produced only when the
	/// parent carries a default mask or the child is a directory, and
	/// directories additionally keep the default entries so grandchildren
	/// inherit them too.
	pub fn inherit(parent: &Acl, uid: u32, gid: u32, creation_mode: u32, file_mode: &mut u32) -> Acl {
		let is_dir = *file_mode & S_IFMT == S_IFDIR;
		let has_default_mask = parent.find(AclTag::Mask, true).is_some();
		let produce_entries = has_default_mask || is_dir;

		let mut child = Vec::new();
		for entry in parent.iter().filter(|e| e.default) {
			let perm = match entry.tag {
				AclTag::UserObj => entry.perm & class_of(creation_mode, 6),
				AclTag::GroupObj | AclTag::Mask => entry.perm & class_of(creation_mode, 3),
				AclTag::Other => entry.perm & class_of(creation_mode, 0),
				AclTag::User | AclTag::Group => entry.perm,
			};

			match entry.tag {
				AclTag::UserObj => set_class(file_mode, 6, perm),
				// With a mask the group class reflects the mask, not GROUP_OBJ.
				AclTag::GroupObj if !has_default_mask => set_class(file_mode, 3, perm),
				AclTag::Mask => set_class(file_mode, 3, perm),
				AclTag::Other => set_class(file_mode, 0, perm),
				_ => {}
			}

			if !produce_entries {
				continue;
			}
			let id = match entry.tag {
				AclTag::UserObj => uid,
				AclTag::GroupObj => gid,
				_ => entry.id,
			};
			child.push(AclEntry::new(entry.tag, id, perm));
			if is_dir {
				child.push(*entry);
			}
		}

		let mut acl = Acl::from_entries(child);
		acl.sort();
		acl
	}
}

//! Access control lists in their compact textual form.
//!
//! An ACL serializes as comma separated `<TypeChar><PermDigit><Id>` entries,
//! for instance `A70,C50,D522,E70,F00`. Type chars run from `A` (`UserObj`)
//! to `F` (`Other`); the lowercase letter is the default (inheritable)
//! variant of the same tag.

mod inherit;


use std::fmt;
use std::str::FromStr;

use crate::error::AclError;

/// Kind of an ACL entry. Discriminants are the wire type numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum AclTag {
	UserObj = 1,
	User = 2,
	GroupObj = 3,
	Group = 4,
	Mask = 5,
	Other = 6,
}

impl AclTag {
	pub const ALL: [AclTag; 6] = [
		AclTag::UserObj,
		AclTag::User,
		AclTag::GroupObj,
		AclTag::Group,
		AclTag::Mask,
		AclTag::Other,
	];

	fn from_number(n: u8) -> Option<Self> {
		Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
	}
}

const DEFAULT_BIT: u8 = 0x20;

/// One `(tag, default, id, perm)` entry.
///
/// `perm` is kept as a raw byte so that out-of-range values survive
/// construction and are reported by [`Acl::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AclEntry {
	pub tag: AclTag,
	pub default: bool,
	pub id: u32,
	pub perm: u8,
}

impl AclEntry {
	pub fn new(tag: AclTag, id: u32, perm: u8) -> Self {
		Self {
			tag,
			default: false,
			id,
			perm,
		}
	}

	/// Same entry, flagged as inheritable.
	pub fn default_of(tag: AclTag, id: u32, perm: u8) -> Self {
		Self {
			default: true,
			..Self::new(tag, id, perm)
		}
	}

	/// Tag number, or-ed with `0x20` for default entries.
	pub fn type_byte(&self) -> u8 {
		let base = self.tag as u8;
		if self.default { base | DEFAULT_BIT } else { base }
	}

	fn sort_key(&self) -> (u8, u32) {
		(self.type_byte(), self.id)
	}

	fn type_char(&self) -> char {
		char::from(b'@' + self.type_byte())
	}

	fn parse(raw: &str) -> Option<Self> {
		let mut chars = raw.chars();
		let type_char = chars.next()?;
		let perm = chars.next()?.to_digit(10)?;
		let id = chars.as_str();
		if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
			return None;
		}

		let type_byte = u8::try_from(u32::from(type_char)).ok()?.checked_sub(b'@')?;
		let tag = AclTag::from_number(type_byte & !DEFAULT_BIT)?;
		Some(Self {
			tag,
			default: type_byte & DEFAULT_BIT != 0,
			id: id.parse().ok()?,
			perm: perm as u8,
		})
	}
}

impl fmt::Display for AclEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}{}", self.type_char(), self.perm, self.id)
	}
}

/// Ordered list of [`AclEntry`] values.
///
/// The empty ACL means "plain mode bits only".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
	entries: Vec<AclEntry>,
}

impl Acl {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_entries(entries: Vec<AclEntry>) -> Self {
		Self { entries }
	}

	pub fn entries(&self) -> &[AclEntry] {
		&self.entries
	}

	pub fn iter(&self) -> std::slice::Iter<'_, AclEntry> {
		self.entries.iter()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn push(&mut self, entry: AclEntry) {
		self.entries.push(entry);
	}

	/// First entry with the given tag and default flag.
	pub fn find(&self, tag: AclTag, default: bool) -> Option<&AclEntry> {
		self.entries.iter().find(|e| e.tag == tag && e.default == default)
	}

	/// Sorts entries by `(type byte, id)`.
	pub fn sort(&mut self) {
		self.entries.sort_by_key(AclEntry::sort_key);
	}

	/// Textual form, entries sorted by `(type byte, id)`.
	pub fn serialize(&self) -> String {
		let mut sorted = self.entries.clone();
		sorted.sort_by_key(AclEntry::sort_key);
		sorted.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
	}

	/// Parses the textual form. The empty string is the empty ACL.
	///
	/// Entry order is preserved; use [`validate`](Self::validate) to enforce
	/// the canonical ordering.
	pub fn deserialize(text: &str) -> Result<Self, AclError> {
		if text.is_empty() {
			return Ok(Self::new());
		}
		text.split(',')
			.enumerate()
			.map(|(position, raw)| {
				AclEntry::parse(raw).ok_or_else(|| AclError::Malformed {
					entry: raw.to_string(),
					position,
				})
			})
			.collect()
	}

	/// Checks the structural rules a stored ACL must obey.
	pub fn validate(&self) -> Result<(), AclError> {
		if self.entries.is_empty() {
			return Ok(());
		}

		for entry in &self.entries {
			if entry.perm > 7 {
				return Err(AclError::InvalidPermission {
					entry: entry.to_string(),
					perm: entry.perm,
				});
			}
		}

		for pair in self.entries.windows(2) {
			let (prev, cur) = (pair[0].sort_key(), pair[1].sort_key());
			if prev == cur {
				return Err(AclError::Duplicate(pair[1].to_string()));
			}
			if prev > cur {
				return Err(AclError::Unsorted(pair[1].to_string()));
			}
		}

		// Sorted and unique from here on, so counting tags is enough.
		let count = |tag, default| self.entries.iter().filter(|e| e.tag == tag && e.default == default).count();

		if count(AclTag::UserObj, false) != 1 || count(AclTag::GroupObj, false) != 1 || count(AclTag::Other, false) != 1 {
			return Err(AclError::Structure(
				"there must be exactly one USER_OBJ, GROUP_OBJ and OTHER entry",
			));
		}
		let named = count(AclTag::User, false) + count(AclTag::Group, false);
		let masks = count(AclTag::Mask, false);
		if masks > 1 || (named > 0 && masks != 1) {
			return Err(AclError::Structure("USER and GROUP entries require exactly one MASK entry"));
		}

		if self.entries.iter().any(|e| e.default) {
			if count(AclTag::UserObj, true) != 1 || count(AclTag::GroupObj, true) != 1 || count(AclTag::Other, true) != 1 {
				return Err(AclError::Structure(
					"default entries must include exactly one USER_OBJ, GROUP_OBJ and OTHER",
				));
			}
			let named = count(AclTag::User, true) + count(AclTag::Group, true);
			let masks = count(AclTag::Mask, true);
			if masks > 1 || (named > 0 && masks != 1) {
				return Err(AclError::Structure(
					"default USER and GROUP entries require exactly one default MASK",
				));
			}
		}

		Ok(())
	}
}

impl fmt::Display for Acl {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.serialize())
	}
}

impl FromStr for Acl {
	type Err = AclError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::deserialize(s)
	}
}

impl FromIterator<AclEntry> for Acl {
	fn from_iter<I: IntoIterator<Item = AclEntry>>(iter: I) -> Self {
		Self::from_entries(iter.into_iter().collect())
	}
}

impl<'a> IntoIterator for &'a Acl {
	type Item = &'a AclEntry;
	type IntoIter = std::slice::Iter<'a, AclEntry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

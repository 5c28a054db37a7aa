use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::permissions::{Access, FileStat, check_permissions, has_group};

/// What a client presented when connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityCredentials {
	/// Authentication mechanism, e.g. `"GSI"` or `"ID"`.
	pub mechanism: String,
	/// DN-like client name.
	pub client_name: String,
	pub remote_address: String,
	pub session_id: String,
	/// VOMS-style FQANs, first one is the primary.
	pub fqans: Vec<String>,
	/// Opaque mechanism data (certificate chain, token, ...).
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub mechanism_data: Vec<u8>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub attributes: BTreeMap<String, String>,
}

impl SecurityCredentials {
	pub fn new(mechanism: impl Into<String>, client_name: impl Into<String>) -> Self {
		Self {
			mechanism: mechanism.into(),
			client_name: client_name.into(),
			..Self::default()
		}
	}

	pub fn with_fqan(mut self, fqan: impl Into<String>) -> Self {
		self.fqans.push(fqan.into());
		self
	}

	pub fn with_remote_address(mut self, address: impl Into<String>) -> Self {
		self.remote_address = address.into();
		self
	}

	pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.insert(key.into(), value.into());
		self
	}
}

/// A resolved user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	pub uid: u32,
	pub name: String,
	pub banned: bool,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub attributes: BTreeMap<String, String>,
}

impl UserInfo {
	pub fn new(uid: u32, name: impl Into<String>) -> Self {
		Self {
			uid,
			name: name.into(),
			..Self::default()
		}
	}

	pub fn with_banned(mut self, banned: bool) -> Self {
		self.banned = banned;
		self
	}
}

/// A resolved group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
	pub gid: u32,
	pub name: String,
	pub banned: bool,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub attributes: BTreeMap<String, String>,
}

impl GroupInfo {
	pub fn new(gid: u32, name: impl Into<String>) -> Self {
		Self {
			gid,
			name: name.into(),
			..Self::default()
		}
	}

	pub fn with_banned(mut self, banned: bool) -> Self {
		self.banned = banned;
		self
	}

	/// Stand-in used when no group could be resolved.
	pub fn root() -> Self {
		Self::new(0, "root")
	}
}

/// Credentials plus the identities they resolved to.
///
/// The group list is never empty: [`SecurityContext::new`] inserts
/// [`GroupInfo::root`] when nothing was resolved, so
/// [`primary_group`](Self::primary_group) is always defined. Contexts are
/// replaced, not mutated, once shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ContextFields")]
pub struct SecurityContext {
	credentials: SecurityCredentials,
	user: UserInfo,
	groups: Vec<GroupInfo>,
}

#[derive(Deserialize)]
struct ContextFields {
	credentials: SecurityCredentials,
	user: UserInfo,
	#[serde(default)]
	groups: Vec<GroupInfo>,
}

impl From<ContextFields> for SecurityContext {
	fn from(fields: ContextFields) -> Self {
		Self::new(fields.credentials, fields.user, fields.groups)
	}
}

impl SecurityContext {
	pub fn new(credentials: SecurityCredentials, user: UserInfo, mut groups: Vec<GroupInfo>) -> Self {
		if groups.is_empty() {
			groups.push(GroupInfo::root());
		}
		Self {
			credentials,
			user,
			groups,
		}
	}

	pub fn credentials(&self) -> &SecurityCredentials {
		&self.credentials
	}

	pub fn user(&self) -> &UserInfo {
		&self.user
	}

	/// Primary group followed by the secondary groups.
	pub fn groups(&self) -> &[GroupInfo] {
		&self.groups
	}

	pub fn primary_group(&self) -> &GroupInfo {
		&self.groups[0]
	}

	pub fn secondary_groups(&self) -> &[GroupInfo] {
		&self.groups[1..]
	}

	/// Whether any non-banned group of this context has `gid`.
	pub fn has_group(&self, gid: u32) -> bool {
		has_group(&self.groups, gid)
	}

	/// Evaluates `requested` against a serialized ACL and file metadata.
	pub fn check(&self, acl: &str, stat: &FileStat, requested: u32) -> Access {
		check_permissions(
			&self.user,
			self.primary_group(),
			self.secondary_groups(),
			acl,
			stat,
			requested,
		)
	}
}

/// Reduces an FQAN to the group name it maps to.
///
/// `/dteam/Role=NULL/Capability=NULL` becomes `dteam`, while
/// `/atlas/Role=production` is kept apart from plain `/atlas` members.
pub fn vo_from_role(fqan: &str) -> String {
	let trimmed = fqan.strip_prefix('/').unwrap_or(fqan);
	let end = ["/Role=NULL", "/Capability=NULL"]
		.iter()
		.filter_map(|suffix| trimmed.find(suffix))
		.min()
		.unwrap_or(trimmed.len());
	trimmed[..end].to_string()
}

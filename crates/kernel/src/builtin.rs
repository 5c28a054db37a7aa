//! Authn backed by the system account database.

use catena_security::{GroupInfo, UserInfo, vo_from_role};
use nix::unistd::{Gid, Group, Uid, User};

use crate::error::{KernelError, Result};
use crate::factory::{AuthnFactory, BaseFactory};
use crate::manager::PluginManager;
use crate::roles::{Authn, BaseInterface};

/// Registered by [`PluginManager::with_builtins`]. Takes no options.
#[derive(Debug, Default)]
pub struct BuiltinAuthnFactory;

impl BaseFactory for BuiltinAuthnFactory {}

impl AuthnFactory for BuiltinAuthnFactory {
	fn create_authn(&self, _manager: &PluginManager) -> Result<Box<dyn Authn>> {
		Ok(Box::new(BuiltinAuthn))
	}
}

/// Maps client names to system users and FQANs to system groups.
#[derive(Debug, Default)]
pub struct BuiltinAuthn;

fn lookup_failed(what: String) -> impl FnOnce(nix::Error) -> KernelError {
	move |errno| KernelError::Io {
		context: what,
		source: errno.into(),
	}
}

fn user_info(user: &User) -> UserInfo {
	UserInfo::new(user.uid.as_raw(), user.name.clone())
}

fn group_info(group: &Group) -> GroupInfo {
	GroupInfo::new(group.gid.as_raw(), group.name.clone())
}

impl BuiltinAuthn {
	fn system_user(name: &str) -> Result<User> {
		User::from_name(name)
			.map_err(lookup_failed(format!("looking up user {name}")))?
			.ok_or_else(|| KernelError::NoSuchUser(name.to_string()))
	}
}

impl BaseInterface for BuiltinAuthn {
	fn impl_id(&self) -> &str {
		"BuiltinAuthn"
	}
}

impl Authn for BuiltinAuthn {
	fn user(&self, name: &str) -> Result<UserInfo> {
		Self::system_user(name).map(|u| user_info(&u))
	}

	fn user_by_id(&self, uid: u32) -> Result<UserInfo> {
		User::from_uid(Uid::from_raw(uid))
			.map_err(lookup_failed(format!("looking up uid {uid}")))?
			.map(|u| user_info(&u))
			.ok_or_else(|| KernelError::NoSuchUser(uid.to_string()))
	}

	fn group(&self, name: &str) -> Result<GroupInfo> {
		Group::from_name(name)
			.map_err(lookup_failed(format!("looking up group {name}")))?
			.map(|g| group_info(&g))
			.ok_or_else(|| KernelError::NoSuchGroup(name.to_string()))
	}

	fn group_by_id(&self, gid: u32) -> Result<GroupInfo> {
		Group::from_gid(Gid::from_raw(gid))
			.map_err(lookup_failed(format!("looking up gid {gid}")))?
			.map(|g| group_info(&g))
			.ok_or_else(|| KernelError::NoSuchGroup(gid.to_string()))
	}

	/// Without group names the account's primary group is used.
	fn id_map(&self, user_name: &str, group_names: &[String]) -> Result<(UserInfo, Vec<GroupInfo>)> {
		let user = Self::system_user(user_name)?;
		let groups = if group_names.is_empty() {
			vec![self.group_by_id(user.gid.as_raw())?]
		} else {
			group_names
				.iter()
				.map(|fqan| self.group(&vo_from_role(fqan)))
				.collect::<Result<_>>()?
		};
		Ok((user_info(&user), groups))
	}
}

#[cfg(test)]
mod tests {
	use catena_security::SecurityCredentials;

	use super::*;
	use crate::error::ErrorKind;

	#[test]
	fn resolves_root_account() {
		let authn = BuiltinAuthn;
		assert_eq!(authn.user_by_id(0).unwrap().name, "root");
		assert_eq!(authn.user("root").unwrap().uid, 0);
	}

	#[test]
	fn unknown_names_are_reported() {
		let authn = BuiltinAuthn;
		assert_eq!(authn.user("catena-no-such-user").unwrap_err().kind(), ErrorKind::NoSuchUser);
		assert_eq!(authn.group("catena-no-such-group").unwrap_err().kind(), ErrorKind::NoSuchGroup);
	}

	#[test]
	fn context_falls_back_to_primary_group() {
		let ctx = BuiltinAuthn
			.create_security_context(&SecurityCredentials::new("ID", "root"))
			.unwrap();
		assert_eq!(ctx.user().uid, 0);
		assert_eq!(ctx.primary_group().gid, 0);
	}
}

use catena_security::{GroupInfo, SecurityContext, SecurityCredentials, UserInfo, vo_from_role};

use super::{BaseInterface, unsupported};
use crate::error::Result;

/// Maps credentials to users and groups.
pub trait Authn: BaseInterface {
	/// Resolves `credentials` into a context.
	///
	/// The default maps the client name and FQANs through
	/// [`id_map`](Self::id_map).
	fn create_security_context(&self, credentials: &SecurityCredentials) -> Result<SecurityContext> {
		let (user, groups) = self.id_map(&credentials.client_name, &credentials.fqans)?;
		Ok(SecurityContext::new(credentials.clone(), user, groups))
	}

	fn user(&self, _name: &str) -> Result<UserInfo> {
		unsupported(self, "user")
	}

	fn user_by_id(&self, _uid: u32) -> Result<UserInfo> {
		unsupported(self, "user_by_id")
	}

	fn group(&self, _name: &str) -> Result<GroupInfo> {
		unsupported(self, "group")
	}

	fn group_by_id(&self, _gid: u32) -> Result<GroupInfo> {
		unsupported(self, "group_by_id")
	}

	/// Resolves a user name and its group names (or FQANs) in one go.
	fn id_map(&self, user_name: &str, group_names: &[String]) -> Result<(UserInfo, Vec<GroupInfo>)> {
		let user = self.user(user_name)?;
		let groups = group_names
			.iter()
			.map(|name| self.group(&vo_from_role(name)))
			.collect::<Result<Vec<_>>>()?;
		Ok((user, groups))
	}
}

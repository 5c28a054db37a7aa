//! Kernel error type and its coarse classification.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use catena_pool::PoolError;
use catena_security::AclError;
use thiserror::Error;

/// Result alias used throughout the kernel and by plugins.
pub type Result<T> = std::result::Result<T, KernelError>;

/// The abstract roles a stack is composed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
	Authn,
	INode,
	Catalog,
	PoolManager,
	IODriver,
	PoolDriver,
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Role::Authn => "authn",
			Role::INode => "inode",
			Role::Catalog => "catalog",
			Role::PoolManager => "pool manager",
			Role::IODriver => "I/O driver",
			Role::PoolDriver => "pool driver",
		})
	}
}

/// Coarse classification of a [`KernelError`], stable across variants.
///
/// Callers match on this instead of on the error itself when they only
/// care about the category, e.g. `NoFactory` during stack construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	NoSuchFile,
	NoSuchSymbol,
	ApiVersionMismatch,
	UnknownOption,
	InvalidOption,
	MalformedConfig,
	NoFactory,
	UnknownKey,
	NoAuthn,
	NoCatalog,
	NoINode,
	NoPoolManager,
	NoIODriver,
	NoSecurityContext,
	NoSuchUser,
	NoSuchGroup,
	InvalidAcl,
	PoolExhausted,
	NotImplemented,
	StackReleased,
	Io,
	UnexpectedException,
}

/// Errors raised by the plugin manager, stacks and role implementations.
#[derive(Debug, Error)]
pub enum KernelError {
	/// A library or file could not be opened.
	#[error("cannot open {path}: {reason}")]
	NoSuchFile { path: PathBuf, reason: String },

	/// The plugin symbol is absent from the library.
	#[error("symbol {symbol} not found in {library}: {reason}")]
	NoSuchSymbol {
		library: PathBuf,
		symbol: String,
		reason: String,
	},

	/// The plugin was built against another kernel API.
	#[error(
		"plugin {library} was built for API version {plugin}, this core provides {core}; {}",
		version_hint(.plugin, .core)
	)]
	ApiVersionMismatch { library: PathBuf, plugin: u32, core: u32 },

	/// No registered factory accepted the option.
	#[error("unknown option {key}")]
	UnknownOption { key: String },

	/// A factory recognized the option but rejected its value.
	#[error("invalid value '{value}' for option {key}: {reason}")]
	InvalidOption {
		key: String,
		value: String,
		reason: String,
	},

	/// A configuration line does not follow the directive grammar.
	#[error("malformed configuration: {0}")]
	MalformedConfig(String),

	/// Nothing is registered for the role.
	#[error("no {role} factory registered")]
	NoFactory { role: Role },

	/// No pool driver factory implements the requested pool type.
	#[error("no pool driver implements pool type {0}")]
	UnknownPoolType(String),

	/// Lookup of a missing configuration or side-channel key.
	#[error("unknown key {0}")]
	UnknownKey(String),

	/// The stack was built without an object for the role.
	#[error("no {0} available in this stack")]
	MissingRole(Role),

	/// The role requires credentials that were never set.
	#[error("security context not set")]
	NoSecurityContext,

	#[error("user {0} not found")]
	NoSuchUser(String),

	#[error("group {0} not found")]
	NoSuchGroup(String),

	#[error(transparent)]
	Acl(#[from] AclError),

	#[error(transparent)]
	Pool(#[from] PoolError),

	/// The implementation does not provide the operation.
	#[error("{implementation} does not implement {operation}")]
	NotImplemented {
		implementation: String,
		operation: &'static str,
	},

	/// A [`StackHandle`](crate::StackHandle) outlived its stack.
	#[error("stack instance has been released")]
	StackReleased,

	#[error("{context}: {source}")]
	Io {
		context: String,
		#[source]
		source: std::io::Error,
	},

	/// A plugin or role object panicked.
	#[error("unexpected failure in {context}: {message}")]
	Unexpected { context: String, message: String },

	/// An error raised while processing a configuration file line.
	#[error("{path}:{line}: {source}")]
	AtLine {
		path: PathBuf,
		line: usize,
		#[source]
		source: Box<KernelError>,
	},
}

fn version_hint(plugin: &u32, core: &u32) -> &'static str {
	if plugin < core {
		"upgrade the plugin"
	} else {
		"upgrade the core or downgrade the plugin"
	}
}

impl KernelError {
	pub fn not_implemented(implementation: &str, operation: &'static str) -> Self {
		Self::NotImplemented {
			implementation: implementation.to_string(),
			operation,
		}
	}

	pub fn invalid_option(key: &str, value: &str, reason: impl fmt::Display) -> Self {
		Self::InvalidOption {
			key: key.to_string(),
			value: value.to_string(),
			reason: reason.to_string(),
		}
	}

	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::NoSuchFile { .. } => ErrorKind::NoSuchFile,
			Self::NoSuchSymbol { .. } => ErrorKind::NoSuchSymbol,
			Self::ApiVersionMismatch { .. } => ErrorKind::ApiVersionMismatch,
			Self::UnknownOption { .. } => ErrorKind::UnknownOption,
			Self::InvalidOption { .. } => ErrorKind::InvalidOption,
			Self::MalformedConfig(_) => ErrorKind::MalformedConfig,
			Self::NoFactory { .. } | Self::UnknownPoolType(_) => ErrorKind::NoFactory,
			Self::UnknownKey(_) => ErrorKind::UnknownKey,
			Self::MissingRole(role) => match role {
				Role::Authn => ErrorKind::NoAuthn,
				Role::INode => ErrorKind::NoINode,
				Role::Catalog => ErrorKind::NoCatalog,
				Role::PoolManager => ErrorKind::NoPoolManager,
				Role::IODriver => ErrorKind::NoIODriver,
				Role::PoolDriver => ErrorKind::NoFactory,
			},
			Self::NoSecurityContext => ErrorKind::NoSecurityContext,
			Self::NoSuchUser(_) => ErrorKind::NoSuchUser,
			Self::NoSuchGroup(_) => ErrorKind::NoSuchGroup,
			Self::Acl(_) => ErrorKind::InvalidAcl,
			Self::Pool(PoolError::Create(_)) => ErrorKind::Io,
			Self::Pool(_) => ErrorKind::PoolExhausted,
			Self::NotImplemented { .. } => ErrorKind::NotImplemented,
			Self::StackReleased => ErrorKind::StackReleased,
			Self::Io { .. } => ErrorKind::Io,
			Self::Unexpected { .. } => ErrorKind::UnexpectedException,
			Self::AtLine { source, .. } => source.kind(),
		}
	}
}

/// Runs plugin-provided code, turning a panic into [`KernelError::Unexpected`].
pub(crate) fn catch_panic<T>(context: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
	panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
		let message = panic_message(payload.as_ref());
		tracing::error!(context, %message, "plugin code panicked");
		Err(KernelError::Unexpected {
			context: context.to_string(),
			message,
		})
	})
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"non-string panic payload".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn version_mismatch_message_points_at_the_stale_side() {
		let older = KernelError::ApiVersionMismatch {
			library: "libold.so".into(),
			plugin: 1,
			core: 3,
		};
		assert!(older.to_string().contains("upgrade the plugin"));

		let newer = KernelError::ApiVersionMismatch {
			library: "libnew.so".into(),
			plugin: 9,
			core: 3,
		};
		assert!(newer.to_string().contains("upgrade the core or downgrade the plugin"));
	}

	#[test]
	fn line_errors_keep_the_inner_kind() {
		let err = KernelError::AtLine {
			path: "catena.conf".into(),
			line: 4,
			source: Box::new(KernelError::UnknownOption { key: "Foo".into() }),
		};
		assert_eq!(err.kind(), ErrorKind::UnknownOption);
		assert_eq!(err.to_string(), "catena.conf:4: unknown option Foo");
	}

	#[test]
	fn missing_roles_map_to_role_kinds() {
		assert_eq!(KernelError::MissingRole(Role::Catalog).kind(), ErrorKind::NoCatalog);
		assert_eq!(KernelError::MissingRole(Role::IODriver).kind(), ErrorKind::NoIODriver);
		assert_eq!(KernelError::UnknownPoolType("hdfs".into()).kind(), ErrorKind::NoFactory);
	}

	#[test]
	fn panics_become_unexpected() {
		let err = catch_panic::<()>("test", || panic!("boom")).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::UnexpectedException);
		assert!(err.to_string().contains("boom"));
	}
}

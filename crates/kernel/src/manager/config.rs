//! Line-oriented configuration files.
//!
//! ```text
//! # comment
//! LoadPlugin plugin_mysql /usr/lib/catena/plugin_mysql.so
//! MySqlHost  db.example.org
//! ```
//!
//! `LoadPlugin <symbol> <library>` loads a plugin; any other line sets the
//! option `<key>` to the rest of the line.

use std::fs;
use std::io;
use std::path::Path;

use super::PluginManager;
use crate::error::{KernelError, Result};

#[derive(Debug, PartialEq, Eq)]
pub(super) enum Directive<'a> {
	LoadPlugin { symbol: &'a str, library: &'a str },
	Set { key: &'a str, value: &'a str },
}

/// Parses one line; `None` for blanks and comments.
pub(super) fn parse_line(line: &str) -> Result<Option<Directive<'_>>> {
	let line = line.trim();
	if line.is_empty() || line.starts_with('#') {
		return Ok(None);
	}

	let (key, rest) = match line.split_once(char::is_whitespace) {
		Some((key, rest)) => (key, rest.trim()),
		None => (line, ""),
	};

	if key == "LoadPlugin" {
		let (symbol, library) = rest
			.split_once(char::is_whitespace)
			.map(|(symbol, library)| (symbol, library.trim()))
			.ok_or_else(|| KernelError::MalformedConfig("LoadPlugin expects a symbol and a library path".to_string()))?;
		return Ok(Some(Directive::LoadPlugin { symbol, library }));
	}

	if rest.is_empty() {
		return Err(KernelError::MalformedConfig(format!("option {key} has no value")));
	}
	Ok(Some(Directive::Set { key, value: rest }))
}

impl PluginManager {
	/// Applies a configuration file.
	///
	/// Stops at the first failing line; plugins loaded by earlier lines stay
	/// loaded. Errors carry the file path and 1-based line number.
	pub fn load_configuration(&mut self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		let text = fs::read_to_string(path).map_err(|source| match source.kind() {
			io::ErrorKind::NotFound => KernelError::NoSuchFile {
				path: path.to_path_buf(),
				reason: source.to_string(),
			},
			_ => KernelError::Io {
				context: format!("reading {}", path.display()),
				source,
			},
		})?;

		tracing::debug!(path = %path.display(), "loading configuration");
		for (index, line) in text.lines().enumerate() {
			self.apply_line(line).map_err(|source| KernelError::AtLine {
				path: path.to_path_buf(),
				line: index + 1,
				source: Box::new(source),
			})?;
		}
		Ok(())
	}

	fn apply_line(&mut self, line: &str) -> Result<()> {
		match parse_line(line)? {
			None => Ok(()),
			Some(Directive::LoadPlugin { symbol, library }) => self.load_plugin(library, symbol),
			Some(Directive::Set { key, value }) => self.configure(key, value),
		}
	}
}

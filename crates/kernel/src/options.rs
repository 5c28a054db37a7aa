//! Typed parsing of configuration values for [`BaseFactory::configure`](crate::BaseFactory::configure).

use std::time::Duration;

use crate::error::{KernelError, Result};

/// Accepts `yes/no`, `true/false`, `on/off` and `1/0`, case-insensitively.
pub fn parse_bool(key: &str, value: &str) -> Result<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"yes" | "true" | "on" | "1" => Ok(true),
		"no" | "false" | "off" | "0" => Ok(false),
		_ => Err(KernelError::invalid_option(key, value, "expected yes or no")),
	}
}

pub fn parse_u64(key: &str, value: &str) -> Result<u64> {
	value
		.trim()
		.parse()
		.map_err(|e| KernelError::invalid_option(key, value, e))
}

/// Parses a number of milliseconds.
pub fn parse_duration_ms(key: &str, value: &str) -> Result<Duration> {
	parse_u64(key, value).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;

	#[test]
	fn booleans() {
		assert!(parse_bool("K", "Yes").unwrap());
		assert!(!parse_bool("K", "off").unwrap());
		assert_eq!(parse_bool("K", "maybe").unwrap_err().kind(), ErrorKind::InvalidOption);
	}

	#[test]
	fn numbers_and_durations() {
		assert_eq!(parse_u64("K", " 42 ").unwrap(), 42);
		assert_eq!(parse_duration_ms("K", "1500").unwrap(), Duration::from_millis(1500));
		let err = parse_u64("PoolSize", "-1").unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidOption);
		assert!(err.to_string().contains("PoolSize"));
	}
}

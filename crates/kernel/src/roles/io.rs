use std::io::SeekFrom;

use bitflags::bitflags;

use super::{BaseInterface, unsupported};
use crate::error::{KernelError, Result};
use crate::types::Location;

bitflags! {
	/// How an [`IOHandler`] is opened.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct OpenFlags: u32 {
		const READ = 1 << 0;
		const WRITE = 1 << 1;
		const CREATE = 1 << 2;
		const TRUNCATE = 1 << 3;
		const APPEND = 1 << 4;
		/// Skip token validation, for trusted internal callers.
		const INSECURE = 1 << 5;
	}
}

/// Opens physical files on disk servers.
pub trait IODriver: BaseInterface {
	fn create_io_handler(&self, _pfn: &str, _flags: OpenFlags) -> Result<Box<dyn IOHandler>> {
		unsupported(self, "create_io_handler")
	}

	/// Notifies the driver that a write to `location` completed.
	fn done_writing(&self, _location: &Location) -> Result<()> {
		unsupported(self, "done_writing")
	}
}

/// An open physical file.
pub trait IOHandler: Send {
	fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
		Err(KernelError::not_implemented("IOHandler", "read"))
	}

	fn write(&mut self, _buf: &[u8]) -> Result<usize> {
		Err(KernelError::not_implemented("IOHandler", "write"))
	}

	fn seek(&mut self, _pos: SeekFrom) -> Result<u64> {
		Err(KernelError::not_implemented("IOHandler", "seek"))
	}

	fn close(&mut self) -> Result<()> {
		Ok(())
	}
}

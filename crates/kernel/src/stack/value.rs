/// A value stored in a stack's key/value side channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackValue {
	Bool(bool),
	Int(i64),
	UInt(u64),
	Str(String),
	Strings(Vec<String>),
	Ids(Vec<u32>),
}

impl StackValue {
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Int(n) => Some(*n),
			Self::UInt(n) => i64::try_from(*n).ok(),
			_ => None,
		}
	}

	pub fn as_u64(&self) -> Option<u64> {
		match self {
			Self::UInt(n) => Some(*n),
			Self::Int(n) => u64::try_from(*n).ok(),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_strings(&self) -> Option<&[String]> {
		match self {
			Self::Strings(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_ids(&self) -> Option<&[u32]> {
		match self {
			Self::Ids(v) => Some(v),
			_ => None,
		}
	}
}

macro_rules! impl_from {
	($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
		$(impl From<$ty> for StackValue {
			fn from(value: $ty) -> Self {
				Self::$variant(value $(as $cast)?)
			}
		})*
	};
}

impl_from! {
	bool => Bool,
	i64 => Int,
	i32 => Int as i64,
	u64 => UInt,
	u32 => UInt as u64,
	String => Str,
	Vec<String> => Strings,
	Vec<u32> => Ids,
}

impl From<&str> for StackValue {
	fn from(value: &str) -> Self {
		Self::Str(value.to_string())
	}
}

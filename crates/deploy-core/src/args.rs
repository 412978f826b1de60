//! Constructor and call argument values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A single argument passed to a contract constructor or method.
///
/// Deserialises untagged so configuration files can list plain values:
/// `args = ["0x5fbd…0aa3", 7, true, "name"]`. A string that parses as an
/// [`Address`] becomes [`ConstructorArg::Address`]; any other string stays a
/// [`ConstructorArg::String`].
///
/// The same rule applies when reading back serialised arguments, so a
/// `String` holding a `0x`-prefixed 40-digit hex value reads back as an
/// `Address`. A method that takes such a string needs its argument built in
/// code with [`ConstructorArg::String`], not read from text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstructorArg {
    /// Boolean flag.
    Bool(bool),
    /// Unsigned integer.
    Uint(u64),
    /// Account or contract address.
    Address(Address),
    /// UTF-8 string.
    String(String),
    /// Raw byte string.
    Bytes(Vec<u8>),
}

impl ConstructorArg {
    /// Get the address if this argument is one.
    #[must_use]
    pub const fn as_address(&self) -> Option<Address> {
        match self {
            Self::Address(address) => Some(*address),
            _ => None,
        }
    }

    /// Get the string if this argument is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConstructorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Address(a) => write!(f, "{a}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
        }
    }
}

impl From<Address> for ConstructorArg {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl From<u64> for ConstructorArg {
    fn from(n: u64) -> Self {
        Self::Uint(n)
    }
}

impl From<bool> for ConstructorArg {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for ConstructorArg {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for ConstructorArg {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

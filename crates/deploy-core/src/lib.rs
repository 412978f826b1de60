//! Shared value types for ordered contract deployment.
//!
//! This crate holds the vocabulary every deployment collaborator speaks:
//!
//! - **Addresses and receipts**: [`Address`], [`TxHash`] and [`TxReceipt`]
//! - **Constructor arguments**: [`ConstructorArg`] values passed to a factory
//! - **Transaction overrides**: the validated [`DeployOverrides`] structure
//! - **Signing identity**: the [`SigningIdentity`] a factory deploys as
//! - **Collaborator errors**: [`ChainError`] returned by factories and handles

#![forbid(unsafe_code)]

pub mod address;
pub mod args;
pub mod error;
pub mod overrides;
pub mod signer;

pub use address::{Address, AddressParseError, TxHash, TxReceipt};
pub use args::ConstructorArg;
pub use error::{ChainError, ChainResult};
pub use overrides::{DeployOverrides, OverridesError};
pub use signer::SigningIdentity;

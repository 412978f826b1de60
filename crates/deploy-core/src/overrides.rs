//! Transaction-level overrides applied to every artifact deployment.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a [`DeployOverrides`] value is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverridesError {
    /// A gas limit of zero can never be mined.
    #[error("gas_limit must be greater than zero")]
    ZeroGasLimit,

    /// Legacy and EIP-1559 pricing were both given.
    #[error("gas_price cannot be combined with max_fee_per_gas or max_priority_fee_per_gas")]
    MixedFeeModels,

    /// Priority fee exceeds the fee cap.
    #[error("max_priority_fee_per_gas ({priority}) exceeds max_fee_per_gas ({max})")]
    PriorityFeeAboveCap {
        /// Configured priority fee.
        priority: u64,
        /// Configured fee cap.
        max: u64,
    },
}

/// Recognised transaction overrides.
///
/// Unknown keys are rejected at deserialisation time. All fields are optional;
/// an empty value lets the transport pick its own defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployOverrides {
    /// Gas limit for the transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,

    /// Legacy gas price in wei.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,

    /// EIP-1559 fee cap in wei.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<u64>,

    /// EIP-1559 priority fee in wei.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<u64>,

    /// Explicit sender nonce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,

    /// Value in wei sent along with the deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
}

impl DeployOverrides {
    /// Create an empty set of overrides.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            gas_limit: None,
            gas_price: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            nonce: None,
            value: None,
        }
    }

    /// Set the gas limit.
    #[must_use]
    pub const fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Set a legacy gas price.
    #[must_use]
    pub const fn with_gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    /// Set EIP-1559 fee fields.
    #[must_use]
    pub const fn with_eip1559_fees(mut self, max_fee: u64, priority_fee: u64) -> Self {
        self.max_fee_per_gas = Some(max_fee);
        self.max_priority_fee_per_gas = Some(priority_fee);
        self
    }

    /// Set the nonce.
    #[must_use]
    pub const fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Whether no override is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::new()
    }

    /// Check the overrides for combinations no transport could honour.
    ///
    /// # Errors
    ///
    /// Returns an [`OverridesError`] for a zero gas limit, a legacy gas price
    /// mixed with EIP-1559 fees, or a priority fee above the fee cap.
    pub fn validate(&self) -> Result<(), OverridesError> {
        if self.gas_limit == Some(0) {
            return Err(OverridesError::ZeroGasLimit);
        }

        if self.gas_price.is_some()
            && (self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some())
        {
            return Err(OverridesError::MixedFeeModels);
        }

        if let (Some(max), Some(priority)) = (self.max_fee_per_gas, self.max_priority_fee_per_gas) {
            if priority > max {
                return Err(OverridesError::PriorityFeeAboveCap { priority, max });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_are_valid() {
        let overrides = DeployOverrides::default();
        assert!(overrides.is_empty());
        assert_eq!(overrides.validate(), Ok(()));
    }

    #[test]
    fn zero_gas_limit_rejected() {
        let overrides = DeployOverrides::new().with_gas_limit(0);
        assert_eq!(overrides.validate(), Err(OverridesError::ZeroGasLimit));
    }

    #[test]
    fn mixed_fee_models_rejected() {
        let overrides = DeployOverrides::new()
            .with_gas_price(1_000_000_000)
            .with_eip1559_fees(2_000_000_000, 1_000_000_000);
        assert_eq!(overrides.validate(), Err(OverridesError::MixedFeeModels));
    }

    #[test]
    fn priority_fee_above_cap_rejected() {
        let overrides = DeployOverrides::new().with_eip1559_fees(10, 11);
        assert_eq!(
            overrides.validate(),
            Err(OverridesError::PriorityFeeAboveCap {
                priority: 11,
                max: 10
            })
        );
    }

    #[test]
    fn legacy_overrides_from_toml() {
        let overrides: DeployOverrides = toml::from_str(
            r"
            gas_limit = 8000000
            gas_price = 0
            nonce = 4
            ",
        )
        .unwrap();

        assert_eq!(overrides.gas_limit, Some(8_000_000));
        assert_eq!(overrides.gas_price, Some(0));
        assert_eq!(overrides.nonce, Some(4));
        assert_eq!(overrides.validate(), Ok(()));
    }

    #[test]
    fn unknown_field_rejected() {
        let result: Result<DeployOverrides, _> = toml::from_str("gasLimit = 1");
        assert!(result.is_err());
    }
}

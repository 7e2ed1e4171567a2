//! Asset to reference-currency conversion
//!
//! There is no live price feed. `FixedPricing` values the native asset at a
//! constant and treats every issued asset as a 1:1 stablecoin.

use serde::{Deserialize, Serialize};

/// Native asset symbol after relabelling
pub const NATIVE_SYMBOL: &str = "XLM";

/// Converts an amount of some asset into the reference currency
pub trait PricingPolicy: Send + Sync {
    fn to_reference(&self, asset: &str, amount: f64) -> f64;
}

/// Constant-price policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedPricing {
    /// Reference-currency price of one native unit
    #[serde(default = "default_native_price")]
    pub native_price: f64,
    /// Price applied to every non-native asset
    #[serde(default = "default_issued_price")]
    pub issued_asset_price: f64,
}

fn default_native_price() -> f64 {
    0.10
}

fn default_issued_price() -> f64 {
    1.0
}

impl Default for FixedPricing {
    fn default() -> Self {
        Self {
            native_price: default_native_price(),
            issued_asset_price: default_issued_price(),
        }
    }
}

impl PricingPolicy for FixedPricing {
    fn to_reference(&self, asset: &str, amount: f64) -> f64 {
        if asset == NATIVE_SYMBOL {
            amount * self.native_price
        } else {
            amount * self.issued_asset_price
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_pricing() {
        let pricing = FixedPricing::default();
        assert!((pricing.to_reference("XLM", 100.0) - 10.0).abs() < 1e-9);
        assert!((pricing.to_reference("USDC", 100.0) - 100.0).abs() < 1e-9);
        assert!((pricing.to_reference("EURC", 2.5) - 2.5).abs() < 1e-9);
    }
}

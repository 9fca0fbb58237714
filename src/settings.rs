//! Store settings

use std::{fs, path::Path, time::Duration};

use rusty_money::{Money, MoneyError, iso::Currency};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    catalog::{
        CatalogError,
        fixture::{parse_currency, parse_price},
    },
    checkout::{DEFAULT_PAYMENT_DELAY, DEFAULT_PAYMENT_TIMEOUT},
    pricing::PricingError,
    shipping::ShippingPolicy,
};

/// Settings loading errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// IO error reading the settings file
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid currency or amount
    #[error(transparent)]
    Money(#[from] CatalogError),

    /// Shipping amounts disagree on currency
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A shipping amount was negative
    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),

    /// The payment timeout was zero
    #[error("payment timeout must be greater than zero")]
    ZeroPaymentTimeout,
}

/// Settings file layout
#[derive(Debug, Deserialize)]
#[serde(default)]
struct SettingsFixture {
    currency: String,
    free_shipping_threshold: Option<String>,
    flat_shipping_fee: Option<String>,
    payment_delay_ms: u64,
    payment_timeout_ms: u64,
}

impl Default for SettingsFixture {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            free_shipping_threshold: None,
            flat_shipping_fee: None,
            payment_delay_ms: duration_ms(DEFAULT_PAYMENT_DELAY),
            payment_timeout_ms: duration_ms(DEFAULT_PAYMENT_TIMEOUT),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Store wide configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreSettings {
    currency: &'static Currency,
    shipping: ShippingPolicy<'static>,
    payment_delay: Duration,
    payment_timeout: Duration,
}

impl StoreSettings {
    /// Load settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the settings are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Parse settings from YAML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid, an amount cannot be parsed or
    /// is negative, amounts use different currencies, or the timeout is zero.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SettingsError> {
        let fixture: SettingsFixture = serde_norway::from_str(yaml)?;
        let currency = parse_currency(&fixture.currency)?;

        let standard = ShippingPolicy::standard(currency);

        let threshold = fixture
            .free_shipping_threshold
            .as_deref()
            .map(|price| parse_amount(price, "free_shipping_threshold"))
            .transpose()?
            .unwrap_or_else(|| standard.free_threshold());

        let fee = fixture
            .flat_shipping_fee
            .as_deref()
            .map(|price| parse_amount(price, "flat_shipping_fee"))
            .transpose()?
            .unwrap_or_else(|| standard.flat_fee());

        let shipping = ShippingPolicy::new(threshold, fee)?;

        if shipping.currency() != currency {
            return Err(PricingError::Money(MoneyError::CurrencyMismatch {
                expected: currency.iso_alpha_code,
                actual: shipping.currency().iso_alpha_code,
            })
            .into());
        }

        if fixture.payment_timeout_ms == 0 {
            return Err(SettingsError::ZeroPaymentTimeout);
        }

        Ok(Self {
            currency,
            shipping,
            payment_delay: Duration::from_millis(fixture.payment_delay_ms),
            payment_timeout: Duration::from_millis(fixture.payment_timeout_ms),
        })
    }

    /// Store currency
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Shipping policy
    pub fn shipping(&self) -> ShippingPolicy<'static> {
        self.shipping
    }

    /// Delay of the simulated payment processor
    pub fn payment_delay(&self) -> Duration {
        self.payment_delay
    }

    /// How long checkout waits for payment confirmation
    pub fn payment_timeout(&self) -> Duration {
        self.payment_timeout
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        let shipping = ShippingPolicy::default();

        Self {
            currency: shipping.currency(),
            shipping,
            payment_delay: DEFAULT_PAYMENT_DELAY,
            payment_timeout: DEFAULT_PAYMENT_TIMEOUT,
        }
    }
}

fn parse_amount(
    price: &str,
    name: &'static str,
) -> Result<Money<'static, Currency>, SettingsError> {
    let amount = parse_price(price)?;

    if amount.is_negative() {
        return Err(SettingsError::NegativeAmount(name));
    }

    Ok(amount)
}

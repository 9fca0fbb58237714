//! Pricing
//!
//! The single source of truth for what a product costs. The cart, the checkout
//! summary and order receipts all price through these functions.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{cart::LineItem, products::Product};

/// Errors that can occur while pricing line items.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Multiplying a unit price by its quantity overflowed.
    #[error("line total overflowed for {quantity} x {unit_minor} minor units")]
    Overflow {
        /// Unit price in minor units
        unit_minor: i64,
        /// Quantity being priced
        quantity: u32,
    },

    /// A subtotal or total does not fit in minor units.
    #[error("amount {0} does not fit in minor units")]
    AmountOverflow(String),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Price the customer actually pays per unit: the discount price when set,
/// otherwise the list price.
pub fn effective_price<'a>(product: &Product<'a>) -> Money<'a, Currency> {
    product.discount_price().unwrap_or_else(|| product.price())
}

/// Effective price multiplied by quantity.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the total does not fit in minor units.
pub fn line_total<'a>(item: &LineItem<'a>) -> Result<Money<'a, Currency>, PricingError> {
    let unit = effective_price(item.product());
    let quantity = item.quantity().get();

    let minor = unit
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow {
            unit_minor: unit.to_minor_units(),
            quantity,
        })?;

    Ok(Money::from_minor(minor, unit.currency()))
}

/// Calculates the total price of a list of line items.
///
/// An empty list totals to zero in the given currency. The running sum is
/// kept within `i64` minor units.
///
/// # Errors
///
/// - [`PricingError::Overflow`]: a line total overflowed.
/// - [`PricingError::AmountOverflow`]: the sum no longer fits in minor units.
/// - [`PricingError::Money`]: money arithmetic or currency mismatch error.
pub fn total_price<'a>(
    items: &[LineItem<'a>],
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PricingError> {
    items
        .iter()
        .try_fold(Money::from_minor(0, currency), |acc, item| {
            let sum = acc.add(line_total(item)?)?;

            minor_units(sum)?;

            Ok(sum)
        })
}

/// Exact amount in minor units.
///
/// # Errors
///
/// Returns [`PricingError::AmountOverflow`] if the amount is outside the `i64`
/// range, or [`PricingError::Money`] if it carries a fraction of a minor unit.
pub fn minor_units(amount: Money<'_, Currency>) -> Result<i64, PricingError> {
    amount.try_to_minor_units().map_err(|err| match err {
        MoneyError::Overflow => PricingError::AmountOverflow(amount.to_string()),
        other => PricingError::Money(other),
    })
}

/// Whether the product is on sale.
pub fn is_on_sale(product: &Product<'_>) -> bool {
    product.discount_price().is_some()
}

/// Amount saved per unit by the discount, if any.
pub fn unit_savings<'a>(product: &Product<'a>) -> Option<Money<'a, Currency>> {
    let discount = product.discount_price()?;

    Some(Money::from_minor(
        product.price().to_minor_units() - discount.to_minor_units(),
        product.currency(),
    ))
}

/// Discount as a fraction of the list price, if the product is on sale.
pub fn discount_percentage(product: &Product<'_>) -> Option<Percentage> {
    let savings = Decimal::from_i64(unit_savings(product)?.to_minor_units())?;
    let price = Decimal::from_i64(product.price().to_minor_units())?;

    // Product construction guarantees a positive price.
    savings.checked_div(price).map(Percentage::from)
}

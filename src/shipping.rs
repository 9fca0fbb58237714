//! Shipping and order totals

use rusty_money::{Money, MoneyError, iso::Currency};

use crate::{
    cart::Cart,
    pricing::{PricingError, minor_units},
};

/// Subtotal, in major currency units, at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 500;

/// Shipping fee, in major currency units, charged below the threshold.
pub const FLAT_SHIPPING_FEE: i64 = 40;

/// Flat-fee shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShippingPolicy<'a> {
    free_threshold: Money<'a, Currency>,
    flat_fee: Money<'a, Currency>,
}

impl<'a> ShippingPolicy<'a> {
    /// Creates a policy from a threshold and a fee in the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Money`] if the two amounts use different currencies.
    pub fn new(
        free_threshold: Money<'a, Currency>,
        flat_fee: Money<'a, Currency>,
    ) -> Result<Self, PricingError> {
        ensure_same_currency(free_threshold.currency(), flat_fee.currency())?;

        Ok(Self {
            free_threshold,
            flat_fee,
        })
    }

    /// The standard policy (free from 500, otherwise 40) in the given currency.
    pub fn standard(currency: &'a Currency) -> Self {
        Self {
            free_threshold: Money::from_major(FREE_SHIPPING_THRESHOLD, currency),
            flat_fee: Money::from_major(FLAT_SHIPPING_FEE, currency),
        }
    }

    /// Subtotal at or above which shipping is free.
    pub fn free_threshold(&self) -> Money<'a, Currency> {
        self.free_threshold
    }

    /// Fee charged below the threshold.
    pub fn flat_fee(&self) -> Money<'a, Currency> {
        self.flat_fee
    }

    /// Currency of the policy.
    pub fn currency(&self) -> &'a Currency {
        self.free_threshold.currency()
    }

    /// Shipping cost for a subtotal: zero at or above the threshold, the flat fee below it.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Money`] if the subtotal is in another currency.
    pub fn shipping_cost(
        &self,
        subtotal: Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, PricingError> {
        ensure_same_currency(self.currency(), subtotal.currency())?;

        Ok(self.fee_for(subtotal))
    }

    fn fee_for(&self, subtotal: Money<'a, Currency>) -> Money<'a, Currency> {
        if subtotal.amount() >= self.free_threshold.amount() {
            Money::from_minor(0, self.currency())
        } else {
            self.flat_fee
        }
    }

    /// How much more needs to be spent to qualify for free shipping, if anything.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Money`] if the subtotal is in another currency.
    pub fn amount_until_free_shipping(
        &self,
        subtotal: Money<'a, Currency>,
    ) -> Result<Option<Money<'a, Currency>>, PricingError> {
        let remaining = self.free_threshold.sub(subtotal)?;

        Ok(remaining.is_positive().then_some(remaining))
    }
}

impl Default for ShippingPolicy<'static> {
    fn default() -> Self {
        Self::standard(rusty_money::iso::INR)
    }
}

/// Shipping cost for a subtotal under the standard policy.
pub fn shipping_cost(subtotal: Money<'_, Currency>) -> Money<'_, Currency> {
    ShippingPolicy::standard(subtotal.currency()).fee_for(subtotal)
}

fn ensure_same_currency(expected: &Currency, actual: &Currency) -> Result<(), PricingError> {
    if expected == actual {
        Ok(())
    } else {
        Err(PricingError::Money(MoneyError::CurrencyMismatch {
            expected: expected.iso_alpha_code,
            actual: actual.iso_alpha_code,
        }))
    }
}

/// Totals shown on the cart, checkout and confirmation pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals<'a> {
    subtotal: Money<'a, Currency>,
    shipping: Money<'a, Currency>,
    tax: Money<'a, Currency>,
    total: Money<'a, Currency>,
}

impl<'a> OrderTotals<'a> {
    /// Computes totals for a subtotal. Tax is included in prices, so it is always zero.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] on currency mismatch, or if the subtotal or
    /// total does not fit in minor units.
    pub fn compute(
        subtotal: Money<'a, Currency>,
        policy: &ShippingPolicy<'a>,
    ) -> Result<Self, PricingError> {
        let shipping = policy.shipping_cost(subtotal)?;
        let tax = Money::from_minor(0, subtotal.currency());
        let total = subtotal.add(shipping)?.add(tax)?;

        minor_units(subtotal)?;
        minor_units(total)?;

        Ok(Self {
            subtotal,
            shipping,
            tax,
            total,
        })
    }

    /// Computes totals for the current contents of a cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the subtotal cannot be calculated or is in
    /// another currency to the policy.
    pub fn for_cart(cart: &Cart<'a>, policy: &ShippingPolicy<'a>) -> Result<Self, PricingError> {
        Self::compute(cart.subtotal()?, policy)
    }

    /// Sum of line totals
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Shipping charge
    pub fn shipping(&self) -> Money<'a, Currency> {
        self.shipping
    }

    /// Tax charge (always zero, prices are tax inclusive)
    pub fn tax(&self) -> Money<'a, Currency> {
        self.tax
    }

    /// Amount payable
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Whether shipping was waived.
    pub fn has_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{INR, USD};
    use testresult::TestResult;

    use crate::products::Product;

    use super::*;

    fn rupees(amount: i64) -> Money<'static, Currency> {
        Money::from_major(amount, INR)
    }

    #[test]
    fn shipping_cost_threshold_is_exact_at_500() {
        assert_eq!(shipping_cost(rupees(499)), rupees(40));
        assert_eq!(shipping_cost(rupees(500)), rupees(0));
        assert_eq!(shipping_cost(rupees(0)), rupees(40));
        assert_eq!(shipping_cost(Money::from_minor(499_99, INR)), rupees(40));
    }

    #[test]
    fn policy_matches_free_function() -> TestResult {
        let policy = ShippingPolicy::default();

        for amount in [0, 1, 250, 499, 500, 501, 10_000] {
            assert_eq!(
                policy.shipping_cost(rupees(amount))?,
                shipping_cost(rupees(amount)),
                "policy and free function disagree at {amount}"
            );
        }

        Ok(())
    }

    #[test]
    fn custom_policy_is_respected() -> TestResult {
        let policy = ShippingPolicy::new(rupees(1_000), rupees(75))?;

        assert_eq!(policy.shipping_cost(rupees(999))?, rupees(75));
        assert_eq!(policy.shipping_cost(rupees(1_000))?, rupees(0));

        Ok(())
    }

    #[test]
    fn policy_rejects_mixed_currencies() {
        let result = ShippingPolicy::new(rupees(500), Money::from_major(40, USD));

        assert!(matches!(
            result,
            Err(PricingError::Money(MoneyError::CurrencyMismatch { .. }))
        ));
    }

    #[test]
    fn shipping_cost_rejects_other_currency() {
        let policy = ShippingPolicy::default();

        assert!(policy.shipping_cost(Money::from_major(10, USD)).is_err());
    }

    #[test]
    fn amount_until_free_shipping() -> TestResult {
        let policy = ShippingPolicy::default();

        assert_eq!(
            policy.amount_until_free_shipping(rupees(420))?,
            Some(rupees(80))
        );
        assert_eq!(policy.amount_until_free_shipping(rupees(500))?, None);
        assert_eq!(policy.amount_until_free_shipping(rupees(900))?, None);

        Ok(())
    }

    #[test]
    fn threshold_compares_amounts_beyond_minor_units() -> TestResult {
        let policy = ShippingPolicy::default();
        let huge = Money::from_major(i64::MAX, INR);

        assert_eq!(policy.shipping_cost(huge)?, rupees(0));
        assert_eq!(shipping_cost(huge), rupees(0));
        assert_eq!(policy.amount_until_free_shipping(huge)?, None);

        Ok(())
    }

    #[test]
    fn totals_reject_subtotal_beyond_minor_units() {
        let huge = Money::from_major(i64::MAX, INR);
        let result = OrderTotals::compute(huge, &ShippingPolicy::default());

        assert!(matches!(result, Err(PricingError::AmountOverflow(_))));
    }

    #[test]
    fn totals_add_shipping_below_threshold() -> TestResult {
        let totals = OrderTotals::compute(rupees(205), &ShippingPolicy::default())?;

        assert_eq!(totals.subtotal(), rupees(205));
        assert_eq!(totals.shipping(), rupees(40));
        assert_eq!(totals.tax(), rupees(0));
        assert_eq!(totals.total(), rupees(245));
        assert!(!totals.has_free_shipping());

        Ok(())
    }

    #[test]
    fn totals_follow_cart_mutations() -> TestResult {
        let policy = ShippingPolicy::default();
        let peppers = Product::new(
            "bell-pepper-mix",
            "Mixed Bell Peppers",
            "fruit-vegetables",
            rupees(80),
        )?;
        let mut cart = Cart::new(INR);

        cart.add(&peppers, 6)?;
        assert_eq!(OrderTotals::for_cart(&cart, &policy)?.total(), rupees(520));

        cart.add(&peppers, 1)?;
        let totals = OrderTotals::for_cart(&cart, &policy)?;
        assert_eq!(totals.total(), rupees(560));
        assert!(totals.has_free_shipping());

        Ok(())
    }
}

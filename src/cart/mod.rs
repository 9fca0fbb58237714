//! Cart
//!
//! The session cart. Every mutation goes through [`Cart`], and the derived
//! values (item count and subtotal) are recomputed from the line items on
//! every read.

use std::num::NonZeroU32;

use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::{
    pricing::{PricingError, total_price},
    products::{Product, ProductId},
};

mod line_item;

pub use line_item::LineItem;

/// Errors related to cart mutations.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// Quantities must be at least one; use [`Cart::remove`] to drop a line.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// A product is priced in another currency (product, product currency, cart currency).
    #[error("Product {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(ProductId, &'static str, &'static str),

    /// The quantity for a product would not fit in a `u32`.
    #[error("quantity of {0} would overflow")]
    QuantityOverflow(ProductId),
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart<'a> {
    items: Vec<LineItem<'a>>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create a new, empty cart.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// If the product is already in the cart its quantity is increased,
    /// otherwise a new line item is appended. Stock is not checked.
    ///
    /// Returns the product's quantity after the add.
    ///
    /// # Errors
    ///
    /// - [`CartError::ZeroQuantity`]: `quantity` was zero.
    /// - [`CartError::CurrencyMismatch`]: the product is priced in another currency.
    /// - [`CartError::QuantityOverflow`]: the accumulated quantity overflowed.
    pub fn add(&mut self, product: &Product<'a>, quantity: u32) -> Result<NonZeroU32, CartError> {
        let quantity = NonZeroU32::new(quantity).ok_or(CartError::ZeroQuantity)?;

        let product_currency = product.currency();

        if product_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                product.id().clone(),
                product_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        let updated = if let Some(item) = self.find_mut(product.id()) {
            let updated = item
                .quantity()
                .checked_add(quantity.get())
                .ok_or_else(|| CartError::QuantityOverflow(product.id().clone()))?;

            item.set_quantity(updated);

            updated
        } else {
            self.items.push(LineItem::new(product.clone(), quantity));

            quantity
        };

        debug!(
            product_id = %product.id(),
            added = quantity.get(),
            quantity = updated.get(),
            in_stock = product.in_stock(),
            "added to cart"
        );

        Ok(updated)
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// Unknown products are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] if `quantity` is zero; the cart is left
    /// unchanged. Removing a line is done with [`Cart::remove`] or [`Cart::decrement`].
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        let quantity = NonZeroU32::new(quantity).ok_or(CartError::ZeroQuantity)?;

        if let Some(item) = self.find_mut(product_id) {
            item.set_quantity(quantity);

            debug!(product_id, quantity = quantity.get(), "updated cart quantity");
        }

        Ok(())
    }

    /// Increase the quantity of a product by one. Unknown products are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] if the quantity is already `u32::MAX`.
    pub fn increment(&mut self, product_id: &str) -> Result<(), CartError> {
        if let Some(item) = self.find_mut(product_id) {
            let quantity = item
                .quantity()
                .checked_add(1)
                .ok_or_else(|| CartError::QuantityOverflow(item.product_id().clone()))?;

            item.set_quantity(quantity);

            debug!(product_id, quantity = quantity.get(), "incremented cart quantity");
        }

        Ok(())
    }

    /// Decrease the quantity of a product by one.
    ///
    /// A line at quantity one is removed rather than left at zero. Unknown
    /// products are ignored.
    pub fn decrement(&mut self, product_id: &str) {
        let Some(item) = self.find_mut(product_id) else {
            return;
        };

        match NonZeroU32::new(item.quantity().get() - 1) {
            Some(quantity) => {
                item.set_quantity(quantity);

                debug!(product_id, quantity = quantity.get(), "decremented cart quantity");
            }
            None => {
                self.remove(product_id);
            }
        }
    }

    /// Remove a product from the cart.
    ///
    /// Returns whether a line item was removed; removing an absent product is a no-op.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.items.len();

        self.items
            .retain(|item| item.product_id().as_str() != product_id);

        let removed = self.items.len() != before;

        if removed {
            debug!(product_id, "removed from cart");
        }

        removed
    }

    /// Remove every line item.
    pub fn clear(&mut self) {
        self.items.clear();

        debug!("cleared cart");
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem<'a>] {
        &self.items
    }

    /// Iterate over the line items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem<'a>> {
        self.items.iter()
    }

    /// Get the line item for a product.
    pub fn get(&self, product_id: &str) -> Option<&LineItem<'a>> {
        self.items
            .iter()
            .find(|item| item.product_id().as_str() == product_id)
    }

    /// Quantity of a product in the cart, zero when absent.
    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.get(product_id)
            .map_or(0, |item| item.quantity().get())
    }

    /// Total number of units across all line items.
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity().get()))
            .sum()
    }

    /// Calculate the subtotal of the cart at effective prices.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a line total overflows.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, PricingError> {
        total_price(&self.items, self.currency)
    }

    /// Get the number of distinct line items in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn find_mut(&mut self, product_id: &str) -> Option<&mut LineItem<'a>> {
        self.items
            .iter_mut()
            .find(|item| item.product_id().as_str() == product_id)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{INR, USD};
    use testresult::TestResult;

    use crate::{pricing::line_total, products::ProductError};

    use super::*;

    fn product(id: &str, price: i64) -> Result<Product<'static>, ProductError> {
        Product::new(id, id, "leafy-greens", Money::from_minor(price, INR))
    }

    fn tomatoes() -> Result<Product<'static>, ProductError> {
        product("tomato-vine", 60_00)?.with_discount_price(Money::from_minor(50_00, INR))
    }

    #[test]
    fn new_cart_is_empty() -> TestResult {
        let cart = Cart::new(INR);

        assert!(cart.is_empty());
        assert_eq!(cart.len(), 0);
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.subtotal()?, Money::from_minor(0, INR));
        assert_eq!(cart.currency(), INR);

        Ok(())
    }

    #[test]
    fn repeated_adds_merge_into_one_line() -> TestResult {
        let spinach = product("spinach-fresh", 35_00)?;
        let mut cart = Cart::new(INR);

        cart.add(&spinach, 1)?;
        cart.add(&spinach, 2)?;
        let quantity = cart.add(&spinach, 4)?;

        assert_eq!(quantity.get(), 7);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of("spinach-fresh"), 7);
        assert_eq!(cart.item_count(), 7);

        Ok(())
    }

    #[test]
    fn add_preserves_insertion_order() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(&product("b", 10_00)?, 1)?;
        cart.add(&product("a", 10_00)?, 1)?;
        cart.add(&product("b", 10_00)?, 1)?;

        let ids: Vec<&str> = cart.iter().map(|item| item.product_id().as_str()).collect();

        assert_eq!(ids, vec!["b", "a"]);

        Ok(())
    }

    #[test]
    fn add_zero_quantity_errors() -> TestResult {
        let mut cart = Cart::new(INR);

        let result = cart.add(&product("okra-fresh", 50_00)?, 0);

        assert_eq!(result, Err(CartError::ZeroQuantity));
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn add_currency_mismatch_errors() -> TestResult {
        let mut cart = Cart::new(USD);

        let result = cart.add(&product("okra-fresh", 50_00)?, 1);

        assert_eq!(
            result,
            Err(CartError::CurrencyMismatch(
                ProductId::from("okra-fresh"),
                INR.iso_alpha_code,
                USD.iso_alpha_code,
            ))
        );

        Ok(())
    }

    #[test]
    fn add_accepts_out_of_stock_products() -> TestResult {
        let mut cart = Cart::new(INR);
        let sold_out = product("methi-fresh", 20_00)?.with_stock(false);

        cart.add(&sold_out, 1)?;

        assert_eq!(cart.quantity_of("methi-fresh"), 1);

        Ok(())
    }

    #[test]
    fn add_quantity_overflow_errors() -> TestResult {
        let mut cart = Cart::new(INR);
        let okra = product("okra-fresh", 50_00)?;

        cart.add(&okra, u32::MAX)?;

        let result = cart.add(&okra, 1);

        assert_eq!(
            result,
            Err(CartError::QuantityOverflow(ProductId::from("okra-fresh")))
        );
        assert_eq!(cart.quantity_of("okra-fresh"), u32::MAX);

        Ok(())
    }

    #[test]
    fn update_quantity_sets_value() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(&product("broccoli", 70_00)?, 1)?;
        cart.update_quantity("broccoli", 5)?;

        assert_eq!(cart.quantity_of("broccoli"), 5);

        Ok(())
    }

    #[test]
    fn update_quantity_to_zero_is_rejected() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(&product("broccoli", 70_00)?, 2)?;

        let result = cart.update_quantity("broccoli", 0);

        assert_eq!(result, Err(CartError::ZeroQuantity));
        assert_eq!(cart.quantity_of("broccoli"), 2);

        Ok(())
    }

    #[test]
    fn update_quantity_unknown_product_is_noop() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.update_quantity("missing", 3)?;

        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn decrement_from_one_removes_line() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(&product("cabbage-green", 35_00)?, 2)?;

        cart.decrement("cabbage-green");
        assert_eq!(cart.quantity_of("cabbage-green"), 1);

        cart.decrement("cabbage-green");
        assert!(cart.get("cabbage-green").is_none());
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn increment_and_decrement_unknown_products_are_noops() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.increment("missing")?;
        cart.decrement("missing");

        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn increment_adds_one() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(&product("cabbage-green", 35_00)?, 1)?;
        cart.increment("cabbage-green")?;

        assert_eq!(cart.quantity_of("cabbage-green"), 2);

        Ok(())
    }

    #[test]
    fn remove_reports_whether_anything_was_removed() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(&product("broccoli", 70_00)?, 1)?;

        assert!(cart.remove("broccoli"));
        assert!(!cart.remove("broccoli"));
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn clear_empties_cart() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(&product("broccoli", 70_00)?, 1)?;
        cart.add(&tomatoes()?, 3)?;
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.subtotal()?, Money::from_minor(0, INR));

        Ok(())
    }

    #[test]
    fn subtotal_uses_effective_prices() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(&tomatoes()?, 2)?;
        cart.add(&product("spinach-fresh", 35_00)?, 3)?;

        assert_eq!(cart.subtotal()?, Money::from_minor(205_00, INR));

        Ok(())
    }

    #[test]
    fn subtotal_matches_line_totals_after_mutations() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(&tomatoes()?, 2)?;
        cart.add(&product("spinach-fresh", 35_00)?, 3)?;
        cart.add(&product("broccoli", 70_00)?, 1)?;
        cart.increment("tomato-vine")?;
        cart.decrement("spinach-fresh");
        cart.update_quantity("broccoli", 4)?;
        cart.remove("spinach-fresh");
        cart.add(&product("spinach-fresh", 35_00)?, 1)?;

        let expected = cart.iter().try_fold(0, |acc, item| {
            line_total(item).map(|total| acc + total.to_minor_units())
        })?;

        assert_eq!(cart.subtotal()?.to_minor_units(), expected);
        assert_eq!(expected, 3 * 50_00 + 4 * 70_00 + 35_00);

        Ok(())
    }
}

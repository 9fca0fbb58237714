//! Line items

use std::num::NonZeroU32;

use crate::products::{Product, ProductId};

/// One product and how many of it are in the cart.
#[derive(Clone, Debug, PartialEq)]
pub struct LineItem<'a> {
    product: Product<'a>,
    quantity: NonZeroU32,
}

impl<'a> LineItem<'a> {
    /// Creates a new line item.
    pub fn new(product: Product<'a>, quantity: NonZeroU32) -> Self {
        Self { product, quantity }
    }

    /// Returns the product of the line item
    pub fn product(&self) -> &Product<'a> {
        &self.product
    }

    /// Returns the id of the product
    pub fn product_id(&self) -> &ProductId {
        self.product.id()
    }

    /// Returns the quantity
    pub fn quantity(&self) -> NonZeroU32 {
        self.quantity
    }

    pub(crate) fn set_quantity(&mut self, quantity: NonZeroU32) {
        self.quantity = quantity;
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::INR};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn accessors_return_constructor_values() -> TestResult {
        let product = Product::new(
            "onion-red",
            "Red Onions",
            "root-vegetables",
            Money::from_minor(30_00, INR),
        )?;

        let item = LineItem::new(product.clone(), NonZeroU32::MIN);

        assert_eq!(item.product(), &product);
        assert_eq!(item.product_id().as_str(), "onion-red");
        assert_eq!(item.quantity().get(), 1);

        Ok(())
    }
}

//! Order scripts
//!
//! A YAML description of a shopping session: what goes in the cart and what
//! the customer types into the checkout form. Used by the command line to
//! drive a checkout end to end.

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::{Cart, CartError},
    catalog::Catalog,
    checkout::{PaymentDetails, ShippingDetails},
    products::ProductId,
};

/// Order script errors
#[derive(Debug, Error)]
pub enum ScriptError {
    /// IO error reading the script
    #[error("Failed to read order script: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// The script names a product that is not in the catalog.
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    /// The cart rejected a line.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// One cart line in a script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptLine {
    /// Product id
    pub product: String,

    /// Quantity to add
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// A scripted shopping session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderScript {
    /// Products to add, in order
    #[serde(default)]
    pub items: Vec<ScriptLine>,

    /// Delivery details entered at the shipping stage
    #[serde(default)]
    pub shipping: ShippingDetails,

    /// Payment details entered at the payment stage
    #[serde(default)]
    pub payment: PaymentDetails,
}

impl OrderScript {
    /// Load a script from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Parse a script from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ScriptError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Add every scripted line to the cart.
    ///
    /// # Errors
    ///
    /// - [`ScriptError::UnknownProduct`]: a product is not in the catalog.
    /// - [`ScriptError::Cart`]: the cart rejected a line.
    pub fn fill_cart<'a>(
        &self,
        catalog: &Catalog<'a>,
        cart: &mut Cart<'a>,
    ) -> Result<(), ScriptError> {
        for line in &self.items {
            let product = catalog
                .get_product_by_id(&line.product)
                .ok_or_else(|| ScriptError::UnknownProduct(ProductId::new(line.product.clone())))?;

            cart.add(product, line.quantity)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::INR;
    use testresult::TestResult;

    use crate::checkout::PaymentMethod;

    use super::*;

    #[test]
    fn sample_script_parses() -> TestResult {
        let script = OrderScript::from_yaml_str(include_str!("../fixtures/orders/sample.yml"))?;

        assert_eq!(script.items.len(), 3);
        assert_eq!(script.shipping.pincode, "411001");
        assert_eq!(script.payment.method, PaymentMethod::Upi);
        assert_eq!(script.payment.upi_id, "asha@okbank");

        Ok(())
    }

    #[test]
    fn quantity_defaults_to_one() -> TestResult {
        let script = OrderScript::from_yaml_str("items:\n  - product: broccoli\n")?;

        assert_eq!(
            script.items,
            vec![ScriptLine {
                product: "broccoli".to_string(),
                quantity: 1
            }]
        );

        Ok(())
    }

    #[test]
    fn fill_cart_adds_lines() -> TestResult {
        let catalog = Catalog::builtin()?;
        let script = OrderScript::from_yaml_str(include_str!("../fixtures/orders/sample.yml"))?;
        let mut cart = Cart::new(INR);

        script.fill_cart(&catalog, &mut cart)?;

        assert_eq!(cart.len(), 3);
        assert_eq!(cart.item_count(), 6);
        assert_eq!(cart.quantity_of("tomato-vine"), 3);

        Ok(())
    }

    #[test]
    fn fill_cart_rejects_unknown_products() -> TestResult {
        let catalog = Catalog::builtin()?;
        let script = OrderScript::from_yaml_str("items:\n  - product: durian\n")?;
        let mut cart = Cart::new(INR);

        let result = script.fill_cart(&catalog, &mut cart);

        assert!(matches!(
            result,
            Err(ScriptError::UnknownProduct(id)) if id.as_str() == "durian"
        ));
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn fill_cart_rejects_zero_quantity() -> TestResult {
        let catalog = Catalog::builtin()?;
        let script =
            OrderScript::from_yaml_str("items:\n  - product: broccoli\n    quantity: 0\n")?;
        let mut cart = Cart::new(INR);

        let result = script.fill_cart(&catalog, &mut cart);

        assert!(matches!(
            result,
            Err(ScriptError::Cart(CartError::ZeroQuantity))
        ));

        Ok(())
    }
}

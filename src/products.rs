//! Products

use std::{borrow::Borrow, fmt, ops::Deref};

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;
use thiserror::Error;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Errors raised while constructing a product.
#[derive(Debug, Error, PartialEq)]
pub enum ProductError {
    /// The list price was zero or negative.
    #[error("product {0} must have a positive price")]
    NonPositivePrice(ProductId),

    /// The discount price was not strictly between zero and the list price.
    #[error("product {0} has a discount price that is not below its price")]
    InvalidDiscount(ProductId),

    /// The discount price uses a different currency to the list price.
    #[error("product {id} is priced in {price}, but its discount is in {discount}")]
    DiscountCurrencyMismatch {
        /// Product id
        id: ProductId,
        /// Currency of the list price
        price: &'static str,
        /// Currency of the discount price
        discount: &'static str,
    },

    /// A nutrition value was negative.
    #[error("nutrition value {0} must not be negative")]
    NegativeNutrition(&'static str),
}

/// Unique, human readable product identifier (e.g. `spinach-fresh`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ProductId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Category identifier (e.g. `leafy-greens`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(String);

impl CategoryId {
    /// Creates a new category id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for CategoryId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for CategoryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CategoryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Product category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Category id
    pub id: CategoryId,

    /// Display name
    pub name: String,

    /// Image reference
    pub image: String,
}

/// Nutrition facts per 100g.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NutritionFacts {
    calories: Decimal,
    protein: Decimal,
    carbs: Decimal,
    fiber: Decimal,
}

impl NutritionFacts {
    /// Creates nutrition facts, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::NegativeNutrition`] naming the first negative value.
    pub fn new(
        calories: Decimal,
        protein: Decimal,
        carbs: Decimal,
        fiber: Decimal,
    ) -> Result<Self, ProductError> {
        for (name, value) in [
            ("calories", calories),
            ("protein", protein),
            ("carbs", carbs),
            ("fiber", fiber),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ProductError::NegativeNutrition(name));
            }
        }

        Ok(Self {
            calories,
            protein,
            carbs,
            fiber,
        })
    }

    /// Energy in kcal
    pub fn calories(&self) -> Decimal {
        self.calories
    }

    /// Protein in grams
    pub fn protein(&self) -> Decimal {
        self.protein
    }

    /// Carbohydrates in grams
    pub fn carbs(&self) -> Decimal {
        self.carbs
    }

    /// Fiber in grams
    pub fn fiber(&self) -> Decimal {
        self.fiber
    }
}

/// Product
///
/// Products are immutable once built; the price invariants (positive price,
/// discount strictly below price) are checked on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Product<'a> {
    id: ProductId,
    name: String,
    category: CategoryId,
    price: Money<'a, Currency>,
    discount_price: Option<Money<'a, Currency>>,
    unit: String,
    image: String,
    description: String,
    in_stock: bool,
    featured: bool,
    nutrition: Option<NutritionFacts>,
}

impl<'a> Product<'a> {
    /// Creates an in-stock, non-featured product with the given list price.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::NonPositivePrice`] if the price is not above zero.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        category: impl Into<CategoryId>,
        price: Money<'a, Currency>,
    ) -> Result<Self, ProductError> {
        let id = id.into();

        if price.to_minor_units() <= 0 {
            return Err(ProductError::NonPositivePrice(id));
        }

        Ok(Self {
            id,
            name: name.into(),
            category: category.into(),
            price,
            discount_price: None,
            unit: String::new(),
            image: String::new(),
            description: String::new(),
            in_stock: true,
            featured: false,
            nutrition: None,
        })
    }

    /// Sets the discount price.
    ///
    /// # Errors
    ///
    /// - [`ProductError::DiscountCurrencyMismatch`]: the discount is in another currency.
    /// - [`ProductError::InvalidDiscount`]: the discount is not between zero and the price.
    pub fn with_discount_price(
        mut self,
        discount: Money<'a, Currency>,
    ) -> Result<Self, ProductError> {
        if discount.currency() != self.price.currency() {
            return Err(ProductError::DiscountCurrencyMismatch {
                id: self.id,
                price: self.price.currency().iso_alpha_code,
                discount: discount.currency().iso_alpha_code,
            });
        }

        let minor = discount.to_minor_units();

        if minor <= 0 || minor >= self.price.to_minor_units() {
            return Err(ProductError::InvalidDiscount(self.id));
        }

        self.discount_price = Some(discount);

        Ok(self)
    }

    /// Sets the display unit (e.g. `500g pack`).
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets whether the product is in stock.
    #[must_use]
    pub fn with_stock(mut self, in_stock: bool) -> Self {
        self.in_stock = in_stock;
        self
    }

    /// Sets whether the product is featured.
    #[must_use]
    pub fn with_featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    /// Sets the nutrition facts.
    #[must_use]
    pub fn with_nutrition(mut self, nutrition: NutritionFacts) -> Self {
        self.nutrition = Some(nutrition);
        self
    }

    /// Product id
    pub fn id(&self) -> &ProductId {
        &self.id
    }

    /// Product name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category the product belongs to
    pub fn category(&self) -> &CategoryId {
        &self.category
    }

    /// List price
    pub fn price(&self) -> Money<'a, Currency> {
        self.price
    }

    /// Discount price, if the product is on offer
    pub fn discount_price(&self) -> Option<Money<'a, Currency>> {
        self.discount_price
    }

    /// Display unit
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Image reference
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the product is in stock. Advisory only.
    pub fn in_stock(&self) -> bool {
        self.in_stock
    }

    /// Whether the product is featured on the home page.
    pub fn is_featured(&self) -> bool {
        self.featured
    }

    /// Nutrition facts
    pub fn nutrition(&self) -> Option<&NutritionFacts> {
        self.nutrition.as_ref()
    }

    /// Currency the product is priced in.
    pub fn currency(&self) -> &'a Currency {
        self.price.currency()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{INR, USD};
    use testresult::TestResult;

    use super::*;

    fn tomatoes() -> Result<Product<'static>, ProductError> {
        Product::new(
            "tomato-vine",
            "Vine Tomatoes",
            "fruit-vegetables",
            Money::from_minor(60_00, INR),
        )
    }

    #[test]
    fn new_product_defaults_to_in_stock_and_not_featured() -> TestResult {
        let product = Product::new(
            "okra-fresh",
            "Fresh Okra",
            "exotic",
            Money::from_minor(50_00, INR),
        )?;

        assert!(product.in_stock());
        assert!(!product.is_featured());
        assert_eq!(product.id().as_str(), "okra-fresh");
        assert_eq!(product.category().as_str(), "exotic");
        assert_eq!(product.currency(), INR);

        Ok(())
    }

    #[test]
    fn zero_price_is_rejected() {
        let result = Product::new("free", "Free", "exotic", Money::from_minor(0, INR));

        assert_eq!(
            result.err(),
            Some(ProductError::NonPositivePrice(ProductId::from("free")))
        );
    }

    #[test]
    fn discount_must_be_below_price() -> TestResult {
        let product = tomatoes()?;

        let same = product.clone().with_discount_price(Money::from_minor(60_00, INR));
        let zero = product.clone().with_discount_price(Money::from_minor(0, INR));
        let valid = product.with_discount_price(Money::from_minor(50_00, INR))?;

        assert!(matches!(same, Err(ProductError::InvalidDiscount(_))));
        assert!(matches!(zero, Err(ProductError::InvalidDiscount(_))));
        assert_eq!(valid.discount_price(), Some(Money::from_minor(50_00, INR)));

        Ok(())
    }

    #[test]
    fn discount_in_other_currency_is_rejected() -> TestResult {
        let product = tomatoes()?;

        let result = product.with_discount_price(Money::from_minor(1_00, USD));

        assert!(matches!(
            result,
            Err(ProductError::DiscountCurrencyMismatch {
                price: "INR",
                discount: "USD",
                ..
            })
        ));

        Ok(())
    }

    #[test]
    fn negative_nutrition_is_rejected() {
        let result = NutritionFacts::new(
            Decimal::new(23, 0),
            Decimal::new(-1, 0),
            Decimal::ZERO,
            Decimal::ZERO,
        );

        assert_eq!(result, Err(ProductError::NegativeNutrition("protein")));
    }

    #[test]
    fn product_id_borrows_as_str() {
        let id = ProductId::from("broccoli");
        let borrowed: &str = id.borrow();

        assert_eq!(borrowed, "broccoli");
        assert_eq!(&*id, "broccoli");
        assert_eq!(id.to_string(), "broccoli");
    }
}

//! Catalog Fixtures
//!
//! Serde shapes for the YAML catalog format and their conversion into
//! products and categories.

use rust_decimal::Decimal;
use rusty_money::{
    FormattableCurrency, Money, MoneyError,
    iso::{Currency, EUR, GBP, INR, USD},
};
use serde::Deserialize;

use crate::{
    catalog::CatalogError,
    products::{Category, NutritionFacts, Product},
};

/// Top level catalog document
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// ISO code every product price must use
    pub currency: String,

    /// Categories, in display order
    #[serde(default)]
    pub categories: Vec<CategoryFixture>,

    /// Products, in display order
    #[serde(default)]
    pub products: Vec<ProductFixture>,
}

/// Category Fixture
#[derive(Debug, Deserialize)]
pub struct CategoryFixture {
    /// Category id
    pub id: String,

    /// Display name
    pub name: String,

    /// Image reference
    #[serde(default)]
    pub image: String,
}

impl From<CategoryFixture> for Category {
    fn from(fixture: CategoryFixture) -> Self {
        Category {
            id: fixture.id.into(),
            name: fixture.name,
            image: fixture.image,
        }
    }
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product id
    pub id: String,

    /// Product name
    pub name: String,

    /// Category id
    pub category: String,

    /// Product price (e.g., "35 INR")
    pub price: String,

    /// Optional discount price (e.g., "30 INR")
    #[serde(default)]
    pub discount_price: Option<String>,

    /// Display unit
    #[serde(default)]
    pub unit: String,

    /// Image reference
    #[serde(default)]
    pub image: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Stock flag
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,

    /// Featured flag
    #[serde(default)]
    pub featured: bool,

    /// Nutrition facts
    #[serde(default)]
    pub nutrition: Option<NutritionFixture>,
}

fn in_stock_default() -> bool {
    true
}

/// Nutrition Fixture
#[derive(Debug, Deserialize)]
pub struct NutritionFixture {
    /// Energy in kcal
    pub calories: Decimal,

    /// Protein in grams
    pub protein: Decimal,

    /// Carbohydrates in grams
    pub carbs: Decimal,

    /// Fiber in grams
    pub fiber: Decimal,
}

impl TryFrom<NutritionFixture> for NutritionFacts {
    type Error = CatalogError;

    fn try_from(fixture: NutritionFixture) -> Result<Self, Self::Error> {
        Ok(NutritionFacts::new(
            fixture.calories,
            fixture.protein,
            fixture.carbs,
            fixture.fiber,
        )?)
    }
}

impl TryFrom<ProductFixture> for Product<'_> {
    type Error = CatalogError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let mut product = Product::new(
            fixture.id,
            fixture.name,
            fixture.category,
            parse_price(&fixture.price)?,
        )?
        .with_unit(fixture.unit)
        .with_image(fixture.image)
        .with_description(fixture.description)
        .with_stock(fixture.in_stock)
        .with_featured(fixture.featured);

        if let Some(discount) = fixture.discount_price {
            product = product.with_discount_price(parse_price(&discount)?)?;
        }

        if let Some(nutrition) = fixture.nutrition {
            product = product.with_nutrition(nutrition.try_into()?);
        }

        Ok(product)
    }
}

/// Look up a supported ISO currency by code.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownCurrency`] for unsupported codes.
pub fn parse_currency(code: &str) -> Result<&'static Currency, CatalogError> {
    match code {
        "INR" => Ok(INR),
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(CatalogError::UnknownCurrency(other.to_string())),
    }
}

/// Parse a price written as an amount and a currency code, such as `49.50 INR`.
///
/// Prices are taken exactly as written: an amount finer than the currency's
/// minor unit (`12.345 INR`) is rejected, never rounded.
///
/// # Errors
///
/// - [`CatalogError::InvalidPrice`]: the text is not an amount and a code, or
///   the amount is not a whole number of minor units.
/// - [`CatalogError::UnknownCurrency`]: the code is not a supported currency.
pub fn parse_price(price: &str) -> Result<Money<'static, Currency>, CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidPrice(format!("{price:?}: {reason}"));

    let mut parts = price.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid("expected an amount and a currency code".to_string()));
    };

    let currency = parse_currency(code)?;
    let amount: Decimal = amount.parse().map_err(|err| invalid(format!("{err}")))?;
    let money = Money::from_decimal(amount, currency);

    match money.try_to_minor_units() {
        Ok(_) => Ok(money),
        Err(MoneyError::PrecisionLoss) => Err(invalid(format!(
            "{code} prices have at most {} decimal places",
            currency.exponent()
        ))),
        Err(err) => Err(invalid(format!("{err}"))),
    }
}

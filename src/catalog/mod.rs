//! Catalog
//!
//! The immutable product catalog and the queries the storefront runs against it.

use std::{fs, path::Path};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use slotmap::SlotMap;
use thiserror::Error;
use tracing::debug;

use crate::products::{Category, CategoryId, Product, ProductError, ProductId, ProductKey};

pub mod fixture;
pub mod query;

pub use query::{ProductQuery, SortOrder};

use fixture::{CatalogFixture, parse_currency};

/// The catalog shipped with the crate.
const BUILTIN_CATALOG: &str = include_str!("../../fixtures/catalog/vegetables.yml");

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product priced in a different currency to the catalog
    #[error("Currency mismatch for {product}: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Offending product
        product: ProductId,
        /// Catalog currency
        expected: &'static str,
        /// Product currency
        found: &'static str,
    },

    /// Two products share an id
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(ProductId),

    /// Two categories share an id
    #[error("Duplicate category id: {0}")]
    DuplicateCategory(CategoryId),

    /// Product references a category that does not exist
    #[error("Product {product} references unknown category {category}")]
    UnknownCategory {
        /// Offending product
        product: ProductId,
        /// Missing category
        category: CategoryId,
    },

    /// Invalid product data
    #[error(transparent)]
    Product(#[from] ProductError),
}

/// Catalog
#[derive(Debug, Clone)]
pub struct Catalog<'a> {
    currency: &'static Currency,
    categories: Vec<Category>,
    products: SlotMap<ProductKey, Product<'a>>,

    /// Insertion order, which is also display order
    order: Vec<ProductKey>,

    /// Product id -> `SlotMap` key
    product_keys: FxHashMap<ProductId, ProductKey>,
}

impl<'a> Catalog<'a> {
    /// Create an empty catalog priced in the given currency.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            categories: Vec::new(),
            products: SlotMap::with_key(),
            order: Vec::new(),
            product_keys: FxHashMap::default(),
        }
    }

    /// The twelve-product vegetable catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled YAML is invalid.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the catalog is inconsistent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        debug!(path = %path.display(), "loading catalog");

        Self::from_yaml_str(&contents)
    }

    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid, a price cannot be parsed, or
    /// products and categories are inconsistent.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(yaml)?;
        let mut catalog = Self::new(parse_currency(&fixture.currency)?);

        for category in fixture.categories {
            catalog.insert_category(category.into())?;
        }

        for product in fixture.products {
            catalog.insert_product(product.try_into()?)?;
        }

        debug!(
            products = catalog.len(),
            categories = catalog.categories.len(),
            "catalog loaded"
        );

        Ok(catalog)
    }

    /// Add a category.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateCategory`] if the id is taken.
    pub fn insert_category(&mut self, category: Category) -> Result<(), CatalogError> {
        if self.category(&category.id).is_some() {
            return Err(CatalogError::DuplicateCategory(category.id));
        }

        self.categories.push(category);

        Ok(())
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::CurrencyMismatch`]: the product is priced in another currency.
    /// - [`CatalogError::UnknownCategory`]: the product's category has not been added.
    /// - [`CatalogError::DuplicateProduct`]: the id is taken.
    pub fn insert_product(&mut self, product: Product<'a>) -> Result<ProductKey, CatalogError> {
        if product.currency() != self.currency {
            return Err(CatalogError::CurrencyMismatch {
                product: product.id().clone(),
                expected: self.currency.iso_alpha_code,
                found: product.currency().iso_alpha_code,
            });
        }

        if self.category(product.category()).is_none() {
            return Err(CatalogError::UnknownCategory {
                product: product.id().clone(),
                category: product.category().clone(),
            });
        }

        if self.product_keys.contains_key(product.id()) {
            return Err(CatalogError::DuplicateProduct(product.id().clone()));
        }

        let id = product.id().clone();
        let key = self.products.insert(product);

        self.order.push(key);
        self.product_keys.insert(id, key);

        Ok(key)
    }

    /// Get a product by its id.
    pub fn get_product_by_id(&self, id: &str) -> Option<&Product<'a>> {
        self.product_keys
            .get(id)
            .and_then(|key| self.products.get(*key))
    }

    /// Get a product by its `SlotMap` key.
    pub fn product(&self, key: ProductKey) -> Option<&Product<'a>> {
        self.products.get(key)
    }

    /// Get the `SlotMap` key for a product id.
    pub fn product_key(&self, id: &str) -> Option<ProductKey> {
        self.product_keys.get(id).copied()
    }

    /// All products in catalog order.
    pub fn products(&self) -> impl Iterator<Item = &Product<'a>> {
        self.order.iter().filter_map(|key| self.products.get(*key))
    }

    /// Products in a category, in catalog order. Unknown categories yield nothing.
    pub fn products_by_category(&self, category: &str) -> Vec<&Product<'a>> {
        self.products()
            .filter(|product| product.category().as_str() == category)
            .collect()
    }

    /// Products whose name or description contains the query, ignoring case.
    pub fn search_products(&self, query: &str) -> Vec<&Product<'a>> {
        let term = query.to_lowercase();

        self.products()
            .filter(|product| query::matches_term(product, &term))
            .collect()
    }

    /// Featured products, in catalog order.
    pub fn featured_products(&self) -> Vec<&Product<'a>> {
        self.products()
            .filter(|product| product.is_featured())
            .collect()
    }

    /// Run a listing query: filter, then sort.
    pub fn browse(&self, query: &ProductQuery<'_>) -> Vec<&Product<'a>> {
        let mut products: Vec<&Product<'a>> = self
            .products()
            .filter(|product| query.matches(product))
            .collect();

        query.sort().sort(&mut products);

        products
    }

    /// Categories in display order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Get a category by id.
    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|category| category.id.as_str() == id)
    }

    /// Currency every product is priced in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rusty_money::{Money, iso::INR};
    use testresult::TestResult;

    use super::*;

    fn ids<'p>(products: &[&'p Product<'_>]) -> Vec<&'p str> {
        products.iter().map(|product| product.id().as_str()).collect()
    }

    #[test]
    fn builtin_catalog_loads() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.categories().len(), 5);
        assert_eq!(catalog.currency(), INR);

        Ok(())
    }

    #[test]
    fn get_product_by_id_finds_product() -> TestResult {
        let catalog = Catalog::builtin()?;
        let tomatoes = catalog
            .get_product_by_id("tomato-vine")
            .ok_or("tomatoes missing")?;

        assert_eq!(tomatoes.name(), "Vine Tomatoes");
        assert_eq!(tomatoes.price(), Money::from_major(60, INR));
        assert_eq!(tomatoes.discount_price(), Some(Money::from_major(50, INR)));
        assert!(catalog.get_product_by_id("dragon-fruit").is_none());

        Ok(())
    }

    #[test]
    fn products_by_category_keeps_catalog_order() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert_eq!(
            ids(&catalog.products_by_category("leafy-greens")),
            vec!["spinach-fresh", "broccoli", "methi-fresh", "cabbage-green"]
        );
        assert!(catalog.products_by_category("organic").is_empty());
        assert!(catalog.products_by_category("nonexistent").is_empty());

        Ok(())
    }

    #[test]
    fn search_matches_name_and_description_case_insensitively() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert_eq!(ids(&catalog.search_products("OKRA")), vec!["okra-fresh"]);
        assert_eq!(
            ids(&catalog.search_products("curries")),
            vec!["okra-fresh"]
        );
        assert_eq!(catalog.search_products("").len(), 12);
        assert!(catalog.search_products("durian").is_empty());

        Ok(())
    }

    #[test]
    fn featured_products_in_catalog_order() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert_eq!(
            ids(&catalog.featured_products()),
            vec![
                "spinach-fresh",
                "carrot-organic",
                "bell-pepper-mix",
                "broccoli",
                "methi-fresh"
            ]
        );

        Ok(())
    }

    #[test]
    fn browse_filters_then_sorts() -> TestResult {
        let catalog = Catalog::builtin()?;

        let query = ProductQuery::new()
            .in_category("fruit-vegetables")
            .sorted_by(SortOrder::PriceLowToHigh);

        assert_eq!(
            ids(&catalog.browse(&query)),
            vec!["cucumber-english", "tomato-vine", "bell-pepper-mix"]
        );

        let cheap = ProductQuery::new()
            .max_price(Money::from_major(30, INR))
            .sorted_by(SortOrder::NameAscending);

        assert_eq!(
            ids(&catalog.browse(&cheap)),
            vec!["cucumber-english", "methi-fresh", "onion-red"]
        );

        Ok(())
    }

    #[test]
    fn duplicate_product_is_rejected() -> TestResult {
        let mut catalog = Catalog::builtin()?;
        let duplicate = catalog
            .get_product_by_id("broccoli")
            .ok_or("broccoli missing")?
            .clone();

        let result = catalog.insert_product(duplicate);

        assert!(matches!(
            result,
            Err(CatalogError::DuplicateProduct(id)) if id.as_str() == "broccoli"
        ));

        Ok(())
    }

    #[test]
    fn unknown_category_is_rejected() {
        let result = Catalog::from_yaml_str(
            "currency: INR\nproducts:\n  - id: kale\n    name: Kale\n    category: brassicas\n    price: 90 INR\n",
        );

        assert!(matches!(result, Err(CatalogError::UnknownCategory { .. })));
    }

    #[test]
    fn currency_mismatch_is_rejected() {
        let result = Catalog::from_yaml_str(
            "currency: INR\ncategories:\n  - id: greens\n    name: Greens\nproducts:\n  - id: kale\n    name: Kale\n    category: greens\n    price: 1.50 GBP\n",
        );

        assert!(matches!(
            result,
            Err(CatalogError::CurrencyMismatch {
                expected: "INR",
                found: "GBP",
                ..
            })
        ));
    }

    #[test]
    fn duplicate_category_is_rejected() {
        let result = Catalog::from_yaml_str(
            "currency: INR\ncategories:\n  - id: greens\n    name: Greens\n  - id: greens\n    name: Also Greens\n",
        );

        assert!(matches!(result, Err(CatalogError::DuplicateCategory(_))));
    }

    #[test]
    fn load_reads_yaml_from_disk() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("catalog.yml");

        fs::write(
            &path,
            "currency: INR\ncategories:\n  - id: greens\n    name: Greens\nproducts:\n  - id: kale\n    name: Kale\n    category: greens\n    price: 90 INR\n    featured: true\n",
        )?;

        let catalog = Catalog::load(&path)?;

        assert_eq!(catalog.len(), 1);
        assert_eq!(ids(&catalog.featured_products()), vec!["kale"]);
        assert!(catalog.product_key("kale").is_some());

        Ok(())
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = Catalog::load("does/not/exist.yml");

        assert!(matches!(result, Err(CatalogError::Io(_))));
    }
}

//! Catalog queries
//!
//! Filters and sort orders for the product listing page.

use std::cmp::Reverse;

use clap::ValueEnum;
use rusty_money::{Money, iso::Currency};

use crate::{
    pricing::effective_price,
    products::{CategoryId, Product},
};

/// Sort orders offered on the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortOrder {
    /// Featured products first, otherwise catalog order.
    #[default]
    #[value(name = "featured")]
    Featured,

    /// Cheapest effective price first.
    #[value(name = "price-low")]
    PriceLowToHigh,

    /// Most expensive effective price first.
    #[value(name = "price-high")]
    PriceHighToLow,

    /// Name, A to Z.
    #[value(name = "name-asc")]
    NameAscending,

    /// Name, Z to A.
    #[value(name = "name-desc")]
    NameDescending,
}

impl SortOrder {
    /// Sorts products in place. All orders are stable.
    pub fn sort(self, products: &mut [&Product<'_>]) {
        match self {
            SortOrder::Featured => products.sort_by_key(|product| !product.is_featured()),
            SortOrder::PriceLowToHigh => {
                products.sort_by_key(|product| effective_price(product).to_minor_units());
            }
            SortOrder::PriceHighToLow => {
                products.sort_by_key(|product| Reverse(effective_price(product).to_minor_units()));
            }
            SortOrder::NameAscending => {
                products.sort_by_cached_key(|product| product.name().to_lowercase());
            }
            SortOrder::NameDescending => {
                products.sort_by_cached_key(|product| Reverse(product.name().to_lowercase()));
            }
        }
    }
}

/// Product listing query.
///
/// Every filter is optional; an empty query matches the whole catalog.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery<'a> {
    category: Option<CategoryId>,
    search: Option<String>,
    in_stock_only: bool,
    min_price: Option<Money<'a, Currency>>,
    max_price: Option<Money<'a, Currency>>,
    sort: SortOrder,
}

impl<'a> ProductQuery<'a> {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only products in the given category.
    #[must_use]
    pub fn in_category(mut self, category: impl Into<CategoryId>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Only products whose name or description contains the term, ignoring case.
    #[must_use]
    pub fn matching(mut self, term: impl Into<String>) -> Self {
        let term = term.into().to_lowercase();

        self.search = (!term.is_empty()).then_some(term);
        self
    }

    /// Only products that are in stock.
    #[must_use]
    pub fn in_stock_only(mut self) -> Self {
        self.in_stock_only = true;
        self
    }

    /// Only products whose effective price is at least `min`.
    #[must_use]
    pub fn min_price(mut self, min: Money<'a, Currency>) -> Self {
        self.min_price = Some(min);
        self
    }

    /// Only products whose effective price is at most `max`.
    #[must_use]
    pub fn max_price(mut self, max: Money<'a, Currency>) -> Self {
        self.max_price = Some(max);
        self
    }

    /// Sort order for the results.
    #[must_use]
    pub fn sorted_by(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// The requested sort order.
    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Whether a product passes every filter.
    pub fn matches(&self, product: &Product<'_>) -> bool {
        if let Some(category) = &self.category
            && product.category() != category
        {
            return false;
        }

        if let Some(term) = &self.search
            && !matches_term(product, term)
        {
            return false;
        }

        if self.in_stock_only && !product.in_stock() {
            return false;
        }

        let price = effective_price(product).to_minor_units();

        if let Some(min) = self.min_price
            && price < min.to_minor_units()
        {
            return false;
        }

        if let Some(max) = self.max_price
            && price > max.to_minor_units()
        {
            return false;
        }

        true
    }
}

/// Case-insensitive match on name or description. `term` must already be lowercase.
pub(crate) fn matches_term(product: &Product<'_>, term: &str) -> bool {
    product.name().to_lowercase().contains(term)
        || product.description().to_lowercase().contains(term)
}

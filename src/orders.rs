//! Orders
//!
//! The immutable order snapshot shown on the confirmation page, and its receipt.

use std::{fmt, io, num::NonZeroU32};

use jiff::Timestamp;
use rand::Rng;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, LineItem},
    checkout::{PaymentMethod, ShippingDetails},
    pricing::{PricingError, effective_price, line_total},
    products::ProductId,
    shipping::OrderTotals,
};

/// Errors that can occur when rendering an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Writing the receipt failed.
    #[error("failed to write receipt: {0}")]
    Io(#[from] io::Error),
}

/// Order identifier, e.g. `ORD48213`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderId(String);

impl OrderId {
    /// Upper bound (exclusive) of the numeric part of generated ids.
    pub const MAX_NUMBER: u32 = 100_000;

    /// Wraps an existing id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random `ORD` id.
    pub fn generate() -> Self {
        let number = rand::thread_rng().gen_range(0..Self::MAX_NUMBER);

        Self(format!("ORD{number}"))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A priced line, frozen at the moment the order was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine<'a> {
    product_id: ProductId,
    name: String,
    unit: String,
    quantity: NonZeroU32,
    unit_price: Money<'a, Currency>,
    line_total: Money<'a, Currency>,
}

impl<'a> OrderLine<'a> {
    /// Snapshot a cart line item.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the line total overflows.
    pub fn from_item(item: &LineItem<'a>) -> Result<Self, PricingError> {
        let product = item.product();

        Ok(Self {
            product_id: product.id().clone(),
            name: product.name().to_string(),
            unit: product.unit().to_string(),
            quantity: item.quantity(),
            unit_price: effective_price(product),
            line_total: line_total(item)?,
        })
    }

    /// Product id
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Product name at time of order
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display unit
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Quantity ordered
    pub fn quantity(&self) -> NonZeroU32 {
        self.quantity
    }

    /// Effective unit price charged
    pub fn unit_price(&self) -> Money<'a, Currency> {
        self.unit_price
    }

    /// Unit price times quantity
    pub fn line_total(&self) -> Money<'a, Currency> {
        self.line_total
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order<'a> {
    id: OrderId,
    placed_at: Timestamp,
    customer: ShippingDetails,
    lines: Vec<OrderLine<'a>>,
    totals: OrderTotals<'a>,
    payment_method: PaymentMethod,
    payment_reference: String,
}

impl<'a> Order<'a> {
    /// Snapshot a cart into an order placed now.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a line total overflows.
    pub fn snapshot(
        id: OrderId,
        cart: &Cart<'a>,
        customer: ShippingDetails,
        totals: OrderTotals<'a>,
        payment_method: PaymentMethod,
        payment_reference: impl Into<String>,
    ) -> Result<Self, PricingError> {
        let lines = cart
            .iter()
            .map(OrderLine::from_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            placed_at: Timestamp::now(),
            customer,
            lines,
            totals,
            payment_method,
            payment_reference: payment_reference.into(),
        })
    }

    /// Overrides the placement time.
    #[must_use]
    pub fn with_placed_at(mut self, placed_at: Timestamp) -> Self {
        self.placed_at = placed_at;
        self
    }

    /// Order id
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    /// When the order was placed
    pub fn placed_at(&self) -> Timestamp {
        self.placed_at
    }

    /// Delivery details
    pub fn customer(&self) -> &ShippingDetails {
        &self.customer
    }

    /// Ordered lines, in cart order
    pub fn lines(&self) -> &[OrderLine<'a>] {
        &self.lines
    }

    /// Subtotal, shipping, tax and total
    pub fn totals(&self) -> &OrderTotals<'a> {
        &self.totals
    }

    /// Payment method
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Reference returned by the payment processor
    pub fn payment_reference(&self) -> &str {
        &self.payment_reference
    }

    /// Total number of units ordered.
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Write the order receipt to the given writer.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Io`] if writing fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), OrderError> {
        writeln!(out, "Order {}  ({})", self.id, self.placed_at)?;
        writeln!(out, "Payment: {}", self.payment_method)?;

        if !self.payment_reference.is_empty() {
            writeln!(out, "Reference: {}", self.payment_reference)?;
        }

        write_order_table(&mut out, &self.lines)?;
        write_order_summary(&mut out, &self.totals)?;
        write_delivery(&mut out, &self.customer)?;

        Ok(())
    }
}

fn write_order_table(out: &mut impl io::Write, lines: &[OrderLine<'_>]) -> Result<(), OrderError> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Unit", "Qty", "Price", "Total"]);

    for line in lines {
        builder.push_record([
            line.name.clone(),
            line.unit.clone(),
            line.quantity.to_string(),
            line.unit_price.to_string(),
            line.line_total.to_string(),
        ]);
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "\n{table}")?;

    Ok(())
}

fn write_order_summary(
    out: &mut impl io::Write,
    totals: &OrderTotals<'_>,
) -> Result<(), OrderError> {
    let shipping = if totals.has_free_shipping() {
        "Free".to_string()
    } else {
        totals.shipping().to_string()
    };

    let rows = [
        ("Subtotal:", totals.subtotal().to_string()),
        ("Shipping:", shipping),
        ("Tax:", totals.tax().to_string()),
        ("Total:", totals.total().to_string()),
    ];

    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let value_width = rows
        .iter()
        .map(|(_, value)| value.chars().count())
        .max()
        .unwrap_or(0);

    for (label, value) in &rows {
        writeln!(out, " {label:>label_width$}  {value:>value_width$}")?;
    }

    writeln!(out)?;

    Ok(())
}

fn write_delivery(out: &mut impl io::Write, customer: &ShippingDetails) -> Result<(), OrderError> {
    writeln!(out, "Deliver to:")?;
    writeln!(out, "  {}", customer.name)?;
    writeln!(out, "  {}", customer.address)?;
    writeln!(out, "  {}, {} {}", customer.city, customer.state, customer.pincode)?;
    writeln!(out, "  {}  {}", customer.phone, customer.email)?;

    Ok(())
}

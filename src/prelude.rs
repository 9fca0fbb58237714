//! Greengrocer prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, LineItem},
    catalog::{Catalog, CatalogError, ProductQuery, SortOrder},
    checkout::{
        Checkout, CheckoutError, CheckoutStage, PaymentDetails, PaymentError, PaymentMethod,
        PaymentProcessor, ShippingDetails, SimulatedPaymentProcessor, ValidationError,
    },
    orders::{Order, OrderError, OrderId, OrderLine},
    pricing::{PricingError, effective_price, line_total},
    products::{Category, CategoryId, NutritionFacts, Product, ProductError, ProductId},
    script::{OrderScript, ScriptError},
    settings::{SettingsError, StoreSettings},
    shipping::{OrderTotals, ShippingPolicy, shipping_cost},
};

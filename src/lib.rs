//! Greengrocer
//!
//! Greengrocer is the core of an online vegetable store: an immutable product
//! catalog, a session cart, pricing and shipping rules, and a three stage
//! checkout that turns a cart into an order.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod script;
pub mod settings;
pub mod shipping;

//! Checkout
//!
//! A three stage flow, shipping then payment then confirmation, that consumes
//! the cart and produces an [`Order`].
//!
//! A [`Checkout`] holds the exclusive borrow of its cart, so the cart cannot
//! change while the customer is checking out. Validation failures leave the
//! checkout on its current stage.

use std::{fmt, time::Duration};

use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    cart::Cart,
    orders::{Order, OrderId},
    pricing::{PricingError, minor_units},
    shipping::{OrderTotals, ShippingPolicy},
};

mod form;
mod payment;

pub use form::{
    CardDetails, PaymentDetails, PaymentField, PaymentMethod, ShippingDetails, ShippingField,
    ValidationError,
};
pub use payment::{
    DEFAULT_PAYMENT_DELAY, DEFAULT_PAYMENT_TIMEOUT, MockPaymentProcessor, PaymentConfirmation,
    PaymentError, PaymentProcessor, PaymentRequest, SimulatedPaymentProcessor,
};

/// Checkout errors
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout cannot start with an empty cart.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// The operation is not allowed in the current stage.
    #[error("cannot {operation} during the {stage} stage")]
    InvalidTransition {
        /// Operation that was attempted
        operation: &'static str,
        /// Stage the checkout was in
        stage: CheckoutStage,
    },

    /// The form is incomplete.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The payment was not confirmed.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Order totals could not be calculated.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Checkout stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStage {
    /// Collecting delivery details
    Shipping,

    /// Collecting payment details
    Payment,

    /// Order placed and shown to the customer
    Confirmation,
}

impl CheckoutStage {
    /// Stage name
    pub fn as_str(self) -> &'static str {
        match self {
            CheckoutStage::Shipping => "shipping",
            CheckoutStage::Payment => "payment",
            CheckoutStage::Confirmation => "confirmation",
        }
    }

    /// Step number shown in the progress indicator, starting at 1.
    pub fn number(self) -> u8 {
        match self {
            CheckoutStage::Shipping => 1,
            CheckoutStage::Payment => 2,
            CheckoutStage::Confirmation => 3,
        }
    }
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An in-progress checkout.
#[derive(Debug)]
pub struct Checkout<'c, 'a> {
    cart: &'c mut Cart<'a>,
    policy: ShippingPolicy<'a>,
    stage: CheckoutStage,
    shipping: ShippingDetails,
    payment: PaymentDetails,
    payment_timeout: Duration,

    /// Set once payment is confirmed
    order: Option<Order<'a>>,
}

impl<'c, 'a> Checkout<'c, 'a> {
    /// Start checking out a cart, at the shipping stage with an empty form.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart has no items.
    pub fn start(
        cart: &'c mut Cart<'a>,
        policy: ShippingPolicy<'a>,
    ) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        info!(
            lines = cart.len(),
            items = cart.item_count(),
            "checkout started"
        );

        Ok(Self {
            cart,
            policy,
            stage: CheckoutStage::Shipping,
            shipping: ShippingDetails::default(),
            payment: PaymentDetails::default(),
            payment_timeout: DEFAULT_PAYMENT_TIMEOUT,
            order: None,
        })
    }

    /// Sets how long to wait for the payment processor.
    #[must_use]
    pub fn with_payment_timeout(mut self, payment_timeout: Duration) -> Self {
        self.payment_timeout = payment_timeout;
        self
    }

    /// Current stage
    pub fn stage(&self) -> CheckoutStage {
        self.stage
    }

    /// The cart being checked out.
    pub fn cart(&self) -> &Cart<'a> {
        self.cart
    }

    /// Shipping policy used for the totals.
    pub fn policy(&self) -> &ShippingPolicy<'a> {
        &self.policy
    }

    /// Delivery details entered so far.
    pub fn shipping_details(&self) -> &ShippingDetails {
        &self.shipping
    }

    /// Edit the delivery details.
    pub fn shipping_details_mut(&mut self) -> &mut ShippingDetails {
        &mut self.shipping
    }

    /// Payment details entered so far.
    pub fn payment_details(&self) -> &PaymentDetails {
        &self.payment
    }

    /// Edit the payment details.
    pub fn payment_details_mut(&mut self) -> &mut PaymentDetails {
        &mut self.payment
    }

    /// Totals for the cart as it is now.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the subtotal cannot be calculated.
    pub fn totals(&self) -> Result<OrderTotals<'a>, PricingError> {
        OrderTotals::for_cart(self.cart, &self.policy)
    }

    /// The placed order, once payment has been confirmed.
    pub fn order(&self) -> Option<&Order<'a>> {
        self.order.as_ref()
    }

    /// Validate the delivery details and move on to payment.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InvalidTransition`]: not at the shipping stage.
    /// - [`CheckoutError::Validation`]: a required field is empty; the stage does not change.
    pub fn submit_shipping(&mut self) -> Result<(), CheckoutError> {
        self.expect_stage(CheckoutStage::Shipping, "submit shipping details")?;

        self.shipping.validate()?;

        self.advance(CheckoutStage::Payment);

        Ok(())
    }

    /// Go back from payment to shipping, keeping everything entered so far.
    ///
    /// Does nothing at the shipping stage.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] once the order is confirmed.
    pub fn back_to_shipping(&mut self) -> Result<(), CheckoutError> {
        match self.stage {
            CheckoutStage::Shipping => Ok(()),
            CheckoutStage::Payment => {
                self.advance(CheckoutStage::Shipping);

                Ok(())
            }
            CheckoutStage::Confirmation => Err(CheckoutError::InvalidTransition {
                operation: "go back to shipping",
                stage: self.stage,
            }),
        }
    }

    /// Validate the payment details, confirm the payment and place the order.
    ///
    /// The processor call is bounded by the payment timeout. Nothing changes
    /// until the processor answers, so dropping the returned future abandons
    /// the attempt and leaves the checkout at the payment stage.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InvalidTransition`]: not at the payment stage.
    /// - [`CheckoutError::Validation`]: the selected method is missing details.
    /// - [`CheckoutError::Payment`]: the processor declined or timed out.
    /// - [`CheckoutError::Pricing`]: totals could not be calculated.
    pub async fn submit_payment<P>(&mut self, processor: &P) -> Result<&Order<'a>, CheckoutError>
    where
        P: PaymentProcessor + ?Sized,
    {
        self.expect_stage(CheckoutStage::Payment, "submit payment")?;

        self.payment.validate()?;

        let totals = self.totals()?;
        let order_id = OrderId::generate();

        let request = PaymentRequest {
            order_id: order_id.clone(),
            amount_minor: minor_units(totals.total())?,
            currency: totals.total().currency().iso_alpha_code,
            method: self.payment.method,
        };

        info!(
            order_id = %order_id,
            method = self.payment.method.code(),
            amount = %totals.total(),
            "processing payment"
        );

        let confirmation = match timeout(self.payment_timeout, processor.confirm(request)).await {
            Ok(Ok(confirmation)) => confirmation,
            Ok(Err(err)) => {
                warn!(order_id = %order_id, error = %err, "payment rejected");

                return Err(err.into());
            }
            Err(_elapsed) => {
                warn!(order_id = %order_id, timeout = ?self.payment_timeout, "payment timed out");

                return Err(PaymentError::TimedOut(self.payment_timeout).into());
            }
        };

        let order = Order::snapshot(
            order_id,
            self.cart,
            self.shipping.clone(),
            totals,
            self.payment.method,
            confirmation.reference,
        )?;

        info!(
            order_id = %order.id(),
            total = %order.totals().total(),
            "order placed"
        );

        self.advance(CheckoutStage::Confirmation);

        Ok(self.order.insert(order))
    }

    /// Finish checkout: clear the cart and hand back the order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] before the order is
    /// confirmed. The cart is left untouched in that case.
    pub fn complete_order(mut self) -> Result<Order<'a>, CheckoutError> {
        let Some(order) = self.order.take() else {
            return Err(CheckoutError::InvalidTransition {
                operation: "complete the order",
                stage: self.stage,
            });
        };

        self.cart.clear();

        info!(order_id = %order.id(), "checkout completed");

        Ok(order)
    }

    /// Leave checkout without placing an order. The cart is left untouched.
    pub fn abandon(self) {
        info!(stage = %self.stage, "checkout abandoned");
    }

    fn expect_stage(
        &self,
        expected: CheckoutStage,
        operation: &'static str,
    ) -> Result<(), CheckoutError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                operation,
                stage: self.stage,
            })
        }
    }

    fn advance(&mut self, stage: CheckoutStage) {
        info!(from = %self.stage, to = %stage, "checkout stage changed");

        self.stage = stage;
    }
}

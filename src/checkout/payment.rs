//! Payment processing

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

use crate::{checkout::PaymentMethod, orders::OrderId};

/// How long the simulated processor takes to confirm a payment.
pub const DEFAULT_PAYMENT_DELAY: Duration = Duration::from_secs(2);

/// How long checkout waits for a processor before giving up.
pub const DEFAULT_PAYMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Payment failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// The processor refused the payment.
    #[error("payment declined: {0}")]
    Declined(String),

    /// The processor did not answer in time.
    #[error("payment timed out after {0:?}")]
    TimedOut(Duration),
}

/// What the processor is asked to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Order being paid for
    pub order_id: OrderId,

    /// Amount due in minor units
    pub amount_minor: i64,

    /// ISO currency code
    pub currency: &'static str,

    /// Selected payment method
    pub method: PaymentMethod,
}

/// Successful payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// Processor reference for the payment
    pub reference: String,
}

/// Confirms payments for orders.
#[automock]
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Confirm a payment.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] if the payment is not confirmed.
    async fn confirm(&self, request: PaymentRequest) -> Result<PaymentConfirmation, PaymentError>;
}

/// Processor that waits for a fixed delay and then approves every payment.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedPaymentProcessor {
    delay: Duration,
}

impl SimulatedPaymentProcessor {
    /// Creates a processor with the given confirmation delay.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Confirmation delay
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedPaymentProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_DELAY)
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedPaymentProcessor {
    async fn confirm(&self, request: PaymentRequest) -> Result<PaymentConfirmation, PaymentError> {
        debug!(
            order_id = %request.order_id,
            method = request.method.code(),
            delay_ms = self.delay.as_millis(),
            "simulating payment"
        );

        sleep(self.delay).await;

        Ok(PaymentConfirmation {
            reference: format!("SIM-{}-{}", request.method.code(), request.order_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use tokio::time::Instant;

    use super::*;

    fn request(method: PaymentMethod) -> PaymentRequest {
        PaymentRequest {
            order_id: OrderId::new("ORD42"),
            amount_minor: 245_00,
            currency: "INR",
            method,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_processor_waits_for_delay() -> TestResult {
        let processor = SimulatedPaymentProcessor::default();
        let started = Instant::now();

        let confirmation = processor.confirm(request(PaymentMethod::Upi)).await?;

        assert!(
            started.elapsed() >= DEFAULT_PAYMENT_DELAY,
            "confirmed before the delay elapsed"
        );
        assert_eq!(confirmation.reference, "SIM-upi-ORD42");

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_processor_accepts_cash_on_delivery() -> TestResult {
        let processor = SimulatedPaymentProcessor::new(Duration::from_millis(10));

        let confirmation = processor
            .confirm(request(PaymentMethod::CashOnDelivery))
            .await?;

        assert_eq!(processor.delay(), Duration::from_millis(10));
        assert_eq!(confirmation.reference, "SIM-cod-ORD42");

        Ok(())
    }
}

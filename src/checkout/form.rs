//! Checkout form
//!
//! The shipping and payment details collected during checkout, and their
//! presence validation.

use std::fmt;

use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;

/// Validation failures raised by checkout stage transitions.
///
/// These are recoverable: the checkout stays on its current stage so the
/// customer can correct the form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required shipping fields were empty.
    #[error("missing required fields: {}", join(.0))]
    MissingField(SmallVec<[ShippingField; 7]>),

    /// The selected payment method is missing details it needs.
    #[error("{method} requires {}", join(.missing))]
    InvalidPaymentDetail {
        /// Selected payment method
        method: PaymentMethod,
        /// Details that were empty
        missing: SmallVec<[PaymentField; 3]>,
    },
}

fn join<I>(fields: I) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    fields
        .into_iter()
        .map(|field| format!("{field}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Required shipping fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShippingField {
    /// Full name
    Name,
    /// Email address
    Email,
    /// Phone number
    Phone,
    /// Street address
    Address,
    /// City
    City,
    /// State
    State,
    /// Postal code
    Pincode,
}

impl ShippingField {
    /// Field name as shown on the form.
    pub fn as_str(self) -> &'static str {
        match self {
            ShippingField::Name => "name",
            ShippingField::Email => "email",
            ShippingField::Phone => "phone",
            ShippingField::Address => "address",
            ShippingField::City => "city",
            ShippingField::State => "state",
            ShippingField::Pincode => "pincode",
        }
    }
}

impl fmt::Display for ShippingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the order is delivered, and who to contact about it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShippingDetails {
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// State
    pub state: String,
    /// Postal code
    pub pincode: String,
}

impl ShippingDetails {
    /// Value of a single field.
    pub fn field(&self, field: ShippingField) -> &str {
        match field {
            ShippingField::Name => &self.name,
            ShippingField::Email => &self.email,
            ShippingField::Phone => &self.phone,
            ShippingField::Address => &self.address,
            ShippingField::City => &self.city,
            ShippingField::State => &self.state,
            ShippingField::Pincode => &self.pincode,
        }
    }

    /// Required fields that are empty, in form order.
    pub fn missing_fields(&self) -> SmallVec<[ShippingField; 7]> {
        [
            ShippingField::Name,
            ShippingField::Email,
            ShippingField::Phone,
            ShippingField::Address,
            ShippingField::City,
            ShippingField::State,
            ShippingField::Pincode,
        ]
        .into_iter()
        .filter(|field| self.field(*field).is_empty())
        .collect()
    }

    /// Checks every required field is present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] listing the empty fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = self.missing_fields();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingField(missing))
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum PaymentMethod {
    /// Pay the courier on delivery
    #[default]
    #[serde(rename = "cod")]
    CashOnDelivery,

    /// UPI transfer
    #[serde(rename = "upi")]
    Upi,

    /// Credit or debit card
    #[serde(rename = "card")]
    Card,
}

impl PaymentMethod {
    /// Short code (`cod`, `upi`, `card`).
    pub fn code(self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cod",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Card => "card",
        }
    }

    /// Label shown on the confirmation page.
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
            PaymentMethod::Upi => "UPI Payment",
            PaymentMethod::Card => "Credit/Debit Card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Method specific payment fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentField {
    /// UPI id (e.g. `name@bank`)
    UpiId,
    /// Card number
    CardNumber,
    /// Card expiry date
    CardExpiry,
    /// Card verification value
    CardCvv,
}

impl fmt::Display for PaymentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentField::UpiId => "UPI id",
            PaymentField::CardNumber => "card number",
            PaymentField::CardExpiry => "card expiry",
            PaymentField::CardCvv => "CVV",
        })
    }
}

/// Card details. Never printed in full.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CardDetails {
    /// Card number
    pub number: String,
    /// Expiry date (e.g. `08/27`)
    pub expiry: String,
    /// Card verification value
    pub cvv: String,
}

impl CardDetails {
    /// Last four digits of the card number, if it has at least four.
    pub fn last_four(&self) -> Option<String> {
        let digits: Vec<char> = self.number.chars().filter(char::is_ascii_digit).collect();

        let start = digits.len().checked_sub(4)?;

        digits.get(start..).map(|tail| tail.iter().collect())
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &self.last_four().map(|last| format!("**** {last}")))
            .field("expiry", &"<redacted>")
            .field("cvv", &"<redacted>")
            .finish()
    }
}

/// Payment method and the details it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaymentDetails {
    /// Selected method
    pub method: PaymentMethod,

    /// UPI id, required for [`PaymentMethod::Upi`]
    pub upi_id: String,

    /// Card details, required for [`PaymentMethod::Card`]
    pub card: CardDetails,
}

impl PaymentDetails {
    /// Cash on delivery, which needs no further details.
    pub fn cash_on_delivery() -> Self {
        Self::default()
    }

    /// UPI payment from the given id.
    pub fn upi(upi_id: impl Into<String>) -> Self {
        Self {
            method: PaymentMethod::Upi,
            upi_id: upi_id.into(),
            card: CardDetails::default(),
        }
    }

    /// Card payment.
    pub fn card(
        number: impl Into<String>,
        expiry: impl Into<String>,
        cvv: impl Into<String>,
    ) -> Self {
        Self {
            method: PaymentMethod::Card,
            upi_id: String::new(),
            card: CardDetails {
                number: number.into(),
                expiry: expiry.into(),
                cvv: cvv.into(),
            },
        }
    }

    /// Details the selected method needs but which are empty.
    pub fn missing_fields(&self) -> SmallVec<[PaymentField; 3]> {
        let required: &[PaymentField] = match self.method {
            PaymentMethod::CashOnDelivery => &[],
            PaymentMethod::Upi => &[PaymentField::UpiId],
            PaymentMethod::Card => &[
                PaymentField::CardNumber,
                PaymentField::CardExpiry,
                PaymentField::CardCvv,
            ],
        };

        required
            .iter()
            .copied()
            .filter(|field| self.field(*field).is_empty())
            .collect()
    }

    /// Checks the selected method has the details it needs.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPaymentDetail`] listing the empty details.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = self.missing_fields();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::InvalidPaymentDetail {
                method: self.method,
                missing,
            })
        }
    }

    fn field(&self, field: PaymentField) -> &str {
        match field {
            PaymentField::UpiId => &self.upi_id,
            PaymentField::CardNumber => &self.card.number,
            PaymentField::CardExpiry => &self.card.expiry,
            PaymentField::CardCvv => &self.card.cvv,
        }
    }
}

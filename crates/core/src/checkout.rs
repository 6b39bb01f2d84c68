//! Checkout and payment notification payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{Cart, ItemRef};
use crate::types::{CURRENCY_CODE, Email};

/// Body of `POST /orders/checkout/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub email: Email,
    pub items: Vec<ItemRef>,
}

impl CheckoutRequest {
    /// Build a request for every item in the cart.
    #[must_use]
    pub fn new(email: Email, cart: &Cart) -> Self {
        Self {
            email,
            items: cart.item_refs(),
        }
    }
}

/// Response of `POST /orders/checkout/`.
///
/// A missing `payment_url` is a server-side failure: the visitor has nowhere
/// to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    #[serde(default)]
    pub order_id: Option<Uuid>,
    #[serde(default)]
    pub payment_url: Option<String>,
}

/// `payment.succeeded` webhook body, shaped like the payment provider's
/// notification. Only the payment emulator sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub event: String,
    pub object: PaymentObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentObject {
    pub id: String,
    pub status: String,
    pub amount: PaymentAmount,
    pub metadata: PaymentMetadata,
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAmount {
    pub value: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub order_id: String,
}

impl PaymentNotification {
    pub const SUCCEEDED: &'static str = "payment.succeeded";

    /// A successful payment of `amount` for `order_id`.
    ///
    /// `amount` is forwarded as given; the API trusts its own order total.
    #[must_use]
    pub fn succeeded(
        payment_id: impl Into<String>,
        order_id: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            event: Self::SUCCEEDED.to_owned(),
            object: PaymentObject {
                id: payment_id.into(),
                status: "succeeded".to_owned(),
                amount: PaymentAmount {
                    value: amount.into(),
                    currency: CURRENCY_CODE.to_owned(),
                },
                metadata: PaymentMetadata {
                    order_id: order_id.into(),
                },
                paid: true,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::{CartItem, ItemKind};
    use crate::types::Price;
    use serde_json::json;

    #[test]
    fn test_checkout_request_shape() {
        let mut cart = Cart::new();
        for (kind, id) in [(ItemKind::Track, 1), (ItemKind::Collection, 5)] {
            cart.add(CartItem {
                item: ItemRef::new(kind, id),
                title: "x".into(),
                price: Price::from_rubles(100),
                image: None,
                slug: "x".into(),
            });
        }
        let request = CheckoutRequest::new(Email::parse("buyer@example.com").unwrap(), &cart);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "email": "buyer@example.com",
                "items": [{"type": "track", "id": 1}, {"type": "collection", "id": 5}]
            })
        );
    }

    #[test]
    fn test_checkout_response_without_url() {
        let response: CheckoutResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.payment_url.is_none());
    }

    #[test]
    fn test_payment_notification_shape() {
        let notification = PaymentNotification::succeeded("mock_payment_abc", "42", "1500.00");
        assert_eq!(
            serde_json::to_value(&notification).unwrap(),
            json!({
                "event": "payment.succeeded",
                "object": {
                    "id": "mock_payment_abc",
                    "status": "succeeded",
                    "amount": {"value": "1500.00", "currency": "RUB"},
                    "metadata": {"order_id": "42"},
                    "paid": true
                }
            })
        );
    }
}

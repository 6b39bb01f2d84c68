//! Payment emulator for development.
//!
//! Stands in for the payment provider's hosted page: it shows the amount,
//! and on confirmation posts a `payment.succeeded` notification to the
//! order webhook exactly as the provider would, then lands on `/success`.
//! Only routed when `PROFFMUSIC_MOCK_PAYMENTS` is enabled.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use proffmusic_core::PaymentNotification;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::middleware::Layout;
use crate::state::AppState;

/// Prefix of emulated payment ids.
const PAYMENT_ID_PREFIX: &str = "mock_payment_";

/// Payment page parameters, as put in the `payment_url` by the API.
#[derive(Debug, Deserialize)]
pub struct PaymentParams {
    pub order_id: Option<String>,
    pub amount: Option<String>,
}

/// Payment emulator template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/mock_payment.html")]
pub struct MockPaymentTemplate {
    pub layout: Layout,
    pub order_id: Option<String>,
    pub amount: String,
    pub error: Option<String>,
}

fn payment_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(9)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{PAYMENT_ID_PREFIX}{suffix}")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Display the emulated payment page.
#[instrument(skip(layout))]
pub async fn show(Query(params): Query<PaymentParams>, layout: Layout) -> MockPaymentTemplate {
    let order_id = non_empty(params.order_id);
    MockPaymentTemplate {
        layout,
        error: order_id.is_none().then(|| "Order ID is missing".to_string()),
        order_id,
        amount: non_empty(params.amount).unwrap_or_else(|| "0".to_string()),
    }
}

/// Confirm the emulated payment.
#[instrument(skip(state, layout))]
pub async fn confirm(
    State(state): State<AppState>,
    layout: Layout,
    Form(params): Form<PaymentParams>,
) -> Response {
    let amount = non_empty(params.amount).unwrap_or_else(|| "0".to_string());
    let Some(order_id) = non_empty(params.order_id) else {
        return MockPaymentTemplate {
            layout,
            order_id: None,
            amount,
            error: Some("Order ID is missing".to_string()),
        }
        .into_response();
    };

    let notification = PaymentNotification::succeeded(payment_id(), order_id.clone(), amount.clone());
    match state.api().send_payment_notification(&notification).await {
        Ok(()) => {
            tracing::info!(order_id = %order_id, "Emulated payment confirmed");
            Redirect::to("/success").into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to deliver emulated payment for order {order_id}: {e}");
            MockPaymentTemplate {
                layout,
                order_id: Some(order_id),
                amount,
                error: Some("Payment confirmation failed, please try again".to_string()),
            }
            .into_response()
        }
    }
}

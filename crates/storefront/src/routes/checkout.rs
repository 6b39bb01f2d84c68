//! Checkout: order creation and the post-payment landing page.
//!
//! The storefront never handles money. `POST /checkout` asks the API for an
//! order and a payment page, then sends the visitor there; the payment
//! provider redirects back to `/success`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use proffmusic_core::{CheckoutRequest, Email};
use serde::Deserialize;
use tracing::instrument;

use super::cart::CartView;
use crate::api::ApiError;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{Layout, OptionalAuth};
use crate::state::AppState;
use crate::stores::{AuthStore, CartStore};

const CHECKOUT_FAILED: &str = "Checkout failed, please try again";
const NO_PAYMENT_LINK: &str = "The server did not return a payment link";
const INVALID_EMAIL: &str = "Enter a valid email address";

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub email: String,
    /// Shown on the form for the receipt; the API does not take it.
    #[serde(default)]
    pub name: Option<String>,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub email: String,
    pub name: String,
    pub error: Option<String>,
}

/// Payment success page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct SuccessTemplate {
    pub layout: Layout,
}

/// Display the checkout form. An empty cart goes back to the home page.
#[instrument(skip_all)]
pub async fn show(cart: CartStore, OptionalAuth(auth): OptionalAuth, layout: Layout) -> Response {
    let cart = cart.load().await;
    if cart.is_empty() {
        return Redirect::to("/").into_response();
    }

    CheckoutTemplate {
        layout,
        cart: CartView::from(&cart),
        email: auth.map(|auth| auth.user.email).unwrap_or_default(),
        name: String::new(),
        error: None,
    }
    .into_response()
}

/// Create the order and redirect to the payment page.
///
/// The bearer token is sent when the visitor is signed in so the order is
/// linked to the account. A token the API rejects is dropped and the order
/// is placed as a guest.
///
/// # Errors
///
/// Returns an error only if the session cannot be modified; API failures
/// re-render the form with a message.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    cart: CartStore,
    auth_store: AuthStore,
    layout: Layout,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = cart.load().await;
    if cart.is_empty() {
        return Ok(Redirect::to("/").into_response());
    }

    let render = |error: &str| CheckoutTemplate {
        layout: layout.clone(),
        cart: CartView::from(&cart),
        email: form.email.trim().to_string(),
        name: form.name.clone().unwrap_or_default(),
        error: Some(error.to_string()),
    };

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => {
            tracing::debug!("Rejected checkout email: {e}");
            return Ok(render(INVALID_EMAIL).into_response());
        }
    };
    let request = CheckoutRequest::new(email, &cart);

    let auth = auth_store.current().await;
    let mut result = state
        .api()
        .checkout(&request, auth.as_ref().map(|a| a.access()))
        .await;
    if matches!(result, Err(ApiError::Unauthorized)) {
        tracing::info!("Stored token rejected at checkout, retrying as guest");
        auth_store.sign_out().await?;
        result = state.api().checkout(&request, None).await;
    }

    match result {
        Ok(response) => match response.payment_url {
            Some(payment_url) => {
                tracing::info!(order_id = ?response.order_id, "Order created, redirecting to payment");
                add_breadcrumb("checkout", "Redirected to payment", None);
                Ok(Redirect::to(&payment_url).into_response())
            }
            None => {
                tracing::error!(order_id = ?response.order_id, "Checkout response without payment_url");
                Ok(render(NO_PAYMENT_LINK).into_response())
            }
        },
        Err(e) => {
            tracing::warn!("Checkout failed: {e}");
            let message = e
                .field_message("error")
                .unwrap_or_else(|| CHECKOUT_FAILED.to_string());
            Ok(render(&message).into_response())
        }
    }
}

/// Landing page after payment. Clears the cart.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
#[instrument(skip_all)]
pub async fn success(cart: CartStore, mut layout: Layout) -> Result<SuccessTemplate> {
    let (cart, ()) = cart.update(proffmusic_core::Cart::clear).await?;
    layout.set_cart(&cart);
    add_breadcrumb("checkout", "Reached payment success page", None);
    Ok(SuccessTemplate { layout })
}

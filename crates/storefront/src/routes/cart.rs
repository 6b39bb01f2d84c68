//! Cart route handlers.
//!
//! The cart lives in the session. Adding posts a kind and slug; the item's
//! title, price and cover are looked up through the (cached) API so a form
//! can never set its own price.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::Redirect};
use proffmusic_core::{Cart, CartItem, ItemKind, ItemRef};
use serde::Deserialize;
use tracing::instrument;

use super::local_redirect;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::Layout;
use crate::state::AppState;
use crate::stores::CartStore;

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub kind: ItemKind,
    pub slug: String,
    pub return_to: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub kind: ItemKind,
    pub id: u32,
    pub return_to: Option<String>,
}

// =============================================================================
// Views
// =============================================================================

/// Cart line display data.
#[derive(Clone, Debug)]
pub struct CartItemView {
    pub kind: &'static str,
    pub kind_label: &'static str,
    pub id: u32,
    pub title: String,
    pub price: String,
    pub image: Option<String>,
    pub href: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        let kind = item.item.kind();
        Self {
            kind: kind.as_str(),
            kind_label: match kind {
                ItemKind::Track => "Track",
                ItemKind::Collection => "Collection",
            },
            id: item.item.raw_id(),
            title: item.title.clone(),
            price: item.price.display(),
            image: item.image.clone(),
            href: item.href(),
        }
    }
}

/// Cart display data.
#[derive(Clone, Debug)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub count: usize,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            total: cart.total().display(),
            count: cart.len(),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(cart, layout))]
pub async fn show(cart: CartStore, layout: Layout) -> CartShowTemplate {
    let cart = cart.load().await;
    CartShowTemplate {
        layout,
        cart: CartView::from(&cart),
    }
}

/// Add a track or collection. Adding an item already in the cart is a no-op.
///
/// # Errors
///
/// Returns the not-found page for an unknown slug, or an error if the
/// session cannot be saved.
#[instrument(skip(state, cart))]
pub async fn add(
    State(state): State<AppState>,
    cart: CartStore,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let item = match form.kind {
        ItemKind::Track => CartItem::from(&state.api().get_track(&form.slug).await?),
        ItemKind::Collection => CartItem::from(&state.api().get_collection(&form.slug).await?),
    };
    let key = item.key();

    let (_, added) = cart.update(|cart| cart.add(item)).await?;
    if added {
        add_breadcrumb("cart", "Added to cart", Some(&[("item", &key)]));
    }

    Ok(local_redirect(form.return_to.as_deref(), "/cart"))
}

/// Remove an item by kind and id. Removing an absent item is a no-op.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
#[instrument(skip(cart))]
pub async fn remove(
    cart: CartStore,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    let item = ItemRef::new(form.kind, form.id);
    let (_, removed) = cart.update(|cart| cart.remove(item)).await?;
    if removed {
        add_breadcrumb("cart", "Removed from cart", Some(&[("item", &item.key())]));
    }

    Ok(local_redirect(form.return_to.as_deref(), "/cart"))
}

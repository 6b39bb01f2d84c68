//! Static information pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, routing::get};
use tracing::instrument;

use crate::filters;
use crate::middleware::Layout;
use crate::state::AppState;

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub layout: Layout,
}

/// Contacts page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/contacts.html")]
pub struct ContactsTemplate {
    pub layout: Layout,
}

/// License terms page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/license.html")]
pub struct LicenseTemplate {
    pub layout: Layout,
}

/// Display the About page.
#[instrument(skip_all)]
pub async fn about(layout: Layout) -> AboutTemplate {
    AboutTemplate { layout }
}

/// Display the Contacts page.
#[instrument(skip_all)]
pub async fn contacts(layout: Layout) -> ContactsTemplate {
    ContactsTemplate { layout }
}

/// Display the License page.
#[instrument(skip_all)]
pub async fn license(layout: Layout) -> LicenseTemplate {
    LicenseTemplate { layout }
}

/// Create the pages routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about", get(about))
        .route("/contacts", get(contacts))
        .route("/license", get(license))
}

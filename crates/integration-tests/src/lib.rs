//! Integration tests for the ProffMusic storefront.
//!
//! Each test spawns the real storefront router on an ephemeral port, wired
//! to an in-process fake of the music API ([`fake_api`]), and drives it with
//! a cookie-keeping `reqwest` client that does not follow redirects.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p proffmusic-integration-tests
//! ```

pub mod fake_api;

use std::collections::HashMap;
use std::net::SocketAddr;

use proffmusic_storefront::config::StorefrontConfig;
use proffmusic_storefront::state::AppState;
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::{Client, Response, multipart, redirect};
use tokio::net::TcpListener;

pub use fake_api::FakeApi;

/// A running storefront and the fake API behind it.
pub struct TestApp {
    pub address: SocketAddr,
    pub client: Client,
    pub api: FakeApi,
}

impl TestApp {
    /// Spawn a storefront without the payment emulator.
    pub async fn spawn() -> Self {
        Self::spawn_with(false).await
    }

    /// Spawn a storefront that serves `/mock-payment`.
    pub async fn spawn_with_mock_payments() -> Self {
        Self::spawn_with(true).await
    }

    /// # Panics
    ///
    /// Panics if the fake API or the storefront cannot start.
    #[allow(clippy::expect_used)]
    async fn spawn_with(mock_payments: bool) -> Self {
        let api = FakeApi::spawn().await;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind storefront");
        let address = listener.local_addr().expect("storefront address");

        let vars: HashMap<&str, String> = HashMap::from([
            ("PROFFMUSIC_BASE_URL", format!("http://{address}")),
            ("PROFFMUSIC_API_URL", api.api_url()),
            ("PROFFMUSIC_MOCK_PAYMENTS", mock_payments.to_string()),
            ("PROFFMUSIC_API_TIMEOUT_SECS", "5".to_string()),
        ]);
        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("test configuration");
        let state = AppState::new(config).expect("application state");
        let app = proffmusic_storefront::app(state);

        tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("test client");

        Self {
            address,
            client,
            api,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    /// GET and return the body, asserting a 200.
    ///
    /// # Panics
    ///
    /// Panics if the page does not answer 200.
    #[allow(clippy::expect_used)]
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), 200, "GET {path}");
        response.text().await.expect("page body")
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request")
    }

    /// Form post asking for the JSON reply the player script uses.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the reply is not JSON.
    #[allow(clippy::expect_used)]
    pub async fn post_json_reply(&self, path: &str, form: &[(&str, &str)]) -> serde_json::Value {
        let response = self
            .client
            .post(self.url(path))
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .expect("POST request");
        assert_eq!(response.status(), 200, "POST {path}");
        response.json().await.expect("JSON body")
    }

    /// Upload `bytes` as the `avatar` part of the profile form.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn upload_avatar(&self, content_type: &str, bytes: Vec<u8>) -> Response {
        let part = multipart::Part::bytes(bytes)
            .file_name("avatar")
            .mime_str(content_type)
            .expect("avatar content type");
        self.client
            .post(self.url("/profile/avatar"))
            .multipart(multipart::Form::new().part("avatar", part))
            .send()
            .await
            .expect("avatar upload")
    }

    /// Sign in as the fake API's known account.
    ///
    /// # Panics
    ///
    /// Panics if the login is not accepted.
    pub async fn login(&self) {
        let response = self
            .post_form(
                "/login",
                &[
                    ("email", fake_api::KNOWN_EMAIL),
                    ("password", fake_api::KNOWN_PASSWORD),
                ],
            )
            .await;
        assert_eq!(response.status(), 303);
        assert_eq!(location(&response), "/profile");
    }
}

/// The `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

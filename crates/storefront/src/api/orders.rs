//! Order placement and the payment emulator's webhook call.

use proffmusic_core::{CheckoutRequest, CheckoutResponse, PaymentNotification};
use tracing::instrument;

use super::{ApiClient, ApiError};

impl ApiClient {
    /// Create an order and obtain the payment page URL.
    ///
    /// The access token, when present, links the order to the account so it
    /// shows up in the order history.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with an `error` message if the order is rejected.
    #[instrument(skip(self, request, access), fields(items = request.items.len()))]
    pub async fn checkout(
        &self,
        request: &CheckoutRequest,
        access: Option<&str>,
    ) -> Result<CheckoutResponse, ApiError> {
        self.post_json(self.endpoint("orders/checkout/")?, request, access)
            .await
    }

    /// Deliver a payment notification to the order webhook.
    ///
    /// # Errors
    ///
    /// Returns error if the API does not acknowledge the notification.
    #[instrument(skip(self, notification), fields(order_id = %notification.object.metadata.order_id))]
    pub async fn send_payment_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<(), ApiError> {
        self.post_json_discard(self.endpoint("orders/webhook/")?, notification, None)
            .await
    }
}

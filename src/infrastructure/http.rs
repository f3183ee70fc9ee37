use crate::config::ClientConfig;
use crate::domain::booking::RawBooking;
use crate::domain::offering::RawOffering;
use crate::domain::ports::BookingService;
use crate::error::{CartError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Error body the booking service sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// [`BookingService`] over HTTP.
///
/// Endpoints, relative to the base URL:
/// `GET routes`, `POST cart/{id}?seats=N`, `POST checkout`, `GET bookings`.
/// Authenticated calls carry `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct HttpBookingService {
    client: Client,
    base_url: Url,
}

impl HttpBookingService {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CartError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CartError::Config(format!(
                "base URL '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CartError::Config(format!("failed to build HTTP client: {e}")))?;
        Self::with_client(client, &config.base_url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CartError::Config(format!("base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Passes success responses through; turns the rest into `Rejected`.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);
        warn!(status = status.as_u16(), message = message.as_deref().unwrap_or(""), "request rejected");
        Err(CartError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

fn transport(error: reqwest::Error) -> CartError {
    CartError::NetworkError(error.to_string())
}

fn malformed(error: reqwest::Error) -> CartError {
    CartError::MalformedResponse(error.to_string())
}

/// Decodes a JSON array one element at a time.
///
/// An element that is not a record becomes `T::default()`, which fails
/// coercion later and is counted as dropped there. Only a body that is not
/// an array at all is malformed.
async fn records<T>(response: Response, what: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned + Default,
{
    let values: Vec<Value> = response.json().await.map_err(malformed)?;
    Ok(values
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(error = %e, "unreadable {what} record");
                T::default()
            })
        })
        .collect())
}

#[async_trait]
impl BookingService for HttpBookingService {
    async fn fetch_offerings(&self) -> Result<Vec<RawOffering>> {
        let url = self.endpoint(&["routes"])?;
        debug!(%url, "fetching offerings");
        let response = self.client.get(url).send().await.map_err(transport)?;
        records(Self::check(response).await?, "offering").await
    }

    async fn stage_line(&self, token: &str, line_id: &str, seats: u32) -> Result<()> {
        let url = self.endpoint(&["cart", line_id])?;
        debug!(%url, seats, "staging line");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[("seats", seats)])
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn confirm_checkout(&self, token: &str) -> Result<Vec<RawBooking>> {
        let url = self.endpoint(&["checkout"])?;
        debug!(%url, "confirming checkout");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        let response = Self::check(response).await?;

        // The checkout already happened server-side; an unreadable body only
        // costs us the booking details.
        match records::<RawBooking>(response, "booking").await {
            Ok(bookings) => Ok(bookings),
            Err(e) => {
                warn!(error = %e, "checkout confirmed but bookings could not be read");
                Ok(Vec::new())
            }
        }
    }

    async fn booking_history(&self, token: &str) -> Result<Vec<RawBooking>> {
        let url = self.endpoint(&["bookings"])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        records(Self::check(response).await?, "booking").await
    }
}

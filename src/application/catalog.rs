use crate::domain::booking::Booking;
use crate::domain::offering::Offering;
use crate::domain::ports::SharedBookingService;
use crate::error::CartError;
use tracing::{info, warn};

/// Outcome of a catalog read.
///
/// `offerings` is always usable (empty when the read failed); a failed read
/// is reported through `error` instead.
#[derive(Debug, Default)]
pub struct CatalogFetch {
    pub offerings: Vec<Offering>,
    /// Records left out because their price or seat count did not parse.
    pub dropped: usize,
    pub error: Option<CartError>,
}

#[derive(Debug, Default)]
pub struct HistoryFetch {
    pub bookings: Vec<Booking>,
    pub dropped: usize,
    pub error: Option<CartError>,
}

/// Converts raw records, leaving out the ones that fail coercion.
pub(crate) fn normalize<R, T>(records: Vec<R>, what: &str) -> (Vec<T>, usize)
where
    T: TryFrom<R, Error = CartError>,
{
    let mut dropped = 0;
    let values = records
        .into_iter()
        .filter_map(|record| match T::try_from(record) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "dropping malformed {what} record");
                dropped += 1;
                None
            }
        })
        .collect();
    (values, dropped)
}

/// Reads route offerings (and booking history) from the booking service.
pub struct CatalogAdapter {
    service: SharedBookingService,
}

impl CatalogAdapter {
    pub fn new(service: SharedBookingService) -> Self {
        Self { service }
    }

    pub async fn fetch_offerings(&self) -> CatalogFetch {
        match self.service.fetch_offerings().await {
            Ok(records) => {
                let (offerings, dropped) = normalize::<_, Offering>(records, "offering");
                info!(offerings = offerings.len(), dropped, "catalog loaded");
                CatalogFetch {
                    offerings,
                    dropped,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch offerings");
                CatalogFetch {
                    error: Some(e),
                    ..Default::default()
                }
            }
        }
    }

    /// Booking history of the signed-in user. Without a token no request is made.
    pub async fn fetch_booking_history(&self, token: Option<&str>) -> HistoryFetch {
        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            return HistoryFetch {
                error: Some(CartError::Unauthenticated),
                ..Default::default()
            };
        };

        match self.service.booking_history(token).await {
            Ok(records) => {
                let (bookings, dropped) = normalize::<_, Booking>(records, "booking");
                HistoryFetch {
                    bookings,
                    dropped,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch booking history");
                HistoryFetch {
                    error: Some(e),
                    ..Default::default()
                }
            }
        }
    }
}

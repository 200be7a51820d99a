use std::sync::Arc;
use tracing::{debug, instrument};
use crate::booking::{RiderBookingView, SeaterBookingView};
use crate::repository::BookingRepository;
use crate::validate::Required;
use crate::CoreResult;

/// Read-only booking projections for both sides of a ride.
#[derive(Clone)]
pub struct ListingService {
    bookings: Arc<dyn BookingRepository>,
}

impl ListingService {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Requests made against rides `owner_id` is driving, newest first.
    #[instrument(name = "listing::rider", skip(self), err(Display))]
    pub async fn bookings_for_rider(&self, owner_id: Option<String>) -> CoreResult<Vec<RiderBookingView>> {
        let mut required = Required::new();
        let owner_id = required.take("studentId", owner_id);
        required.finish()?;

        let rows = self.bookings.list_for_rider(&owner_id).await?;
        debug!(count = rows.len(), "Rider bookings loaded");
        Ok(rows.into_iter().map(RiderBookingView::from).collect())
    }

    /// Requests `seater_id` has made, newest first, with the ride's pickup point and
    /// the rider's contact details.
    #[instrument(name = "listing::seater", skip(self), err(Display))]
    pub async fn bookings_for_seater(&self, seater_id: Option<String>) -> CoreResult<Vec<SeaterBookingView>> {
        let mut required = Required::new();
        let seater_id = required.take("studentId", seater_id);
        required.finish()?;

        let rows = self.bookings.list_for_seater(&seater_id).await?;
        debug!(count = rows.len(), "Seater bookings loaded");
        Ok(rows.into_iter().map(SeaterBookingView::from).collect())
    }
}

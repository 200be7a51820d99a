use std::sync::Arc;
use carpool_shared::{render, Masked};
use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use crate::repository::RideRepository;
use crate::ride::{PostRideRequest, Ride, RideSearch, RideSummary};
use crate::validate::{optional, Required};
use crate::{CoreError, CoreResult};

/// Ride offers and their seat counters.
#[derive(Clone)]
pub struct RideCatalog {
    rides: Arc<dyn RideRepository>,
}

impl RideCatalog {
    pub fn new(rides: Arc<dyn RideRepository>) -> Self {
        Self { rides }
    }

    #[instrument(name = "catalog::post_ride", skip_all, err(Display))]
    pub async fn post_ride(&self, req: PostRideRequest) -> CoreResult<Ride> {
        let mut required = Required::new();
        let student_id = required.take("studentId", req.student_id);
        let rider_name = required.take("riderName", req.rider_name);
        let phone_no = required.take("phoneNo", req.phone_no.map(Masked::into_inner));
        let source = required.take("source", req.source);
        let destination = required.take("destination", req.destination);
        let leave_date = required.take("leaveDate", req.leave_date);
        let leave_time = required.take("leaveTime", req.leave_time);
        let seats = req.seats_available;
        if seats.is_none() {
            required.take("seatsAvailable", None);
        }
        required.finish()?;

        let leave_date = render::parse_date(&leave_date)
            .ok_or_else(|| CoreError::ValidationError("leaveDate must be YYYY-MM-DD".into()))?;
        let leave_time = render::parse_time(&leave_time)
            .ok_or_else(|| CoreError::ValidationError("leaveTime must be HH:MM".into()))?;
        let seats_available = seats
            .and_then(|s| s.value())
            .filter(|n| *n >= 1)
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| CoreError::ValidationError("seatsAvailable must be at least 1".into()))?;

        let ride = Ride {
            id: Uuid::new_v4(),
            student_id,
            rider_name,
            phone_no,
            source,
            destination,
            leave_date,
            leave_time,
            seats_available,
            note: optional(req.note),
            created_at: Utc::now(),
        };

        self.rides.insert_ride(&ride).await?;
        info!(ride_id = %ride.id, seats = ride.seats_available, "Ride posted");

        Ok(ride)
    }

    /// A missing or malformed `date` is a validation failure; callers render it as an
    /// empty result with an error marker.
    #[instrument(name = "catalog::search_rides", skip(self), err(Display))]
    pub async fn search_rides(
        &self,
        destination: Option<String>,
        date: Option<String>,
    ) -> CoreResult<Vec<RideSummary>> {
        let date = optional(date)
            .ok_or_else(|| CoreError::ValidationError("Date is required".into()))?;
        let date = render::parse_date(&date)
            .ok_or_else(|| CoreError::ValidationError("date must be YYYY-MM-DD".into()))?;

        let search = RideSearch {
            destination: optional(destination),
            date,
        };
        let rides = self.rides.search_rides(&search).await?;
        debug!(count = rides.len(), "Ride search complete");

        Ok(rides.into_iter().map(RideSummary::from).collect())
    }

    pub async fn get_ride(&self, id: Uuid) -> CoreResult<Ride> {
        self.rides
            .get_ride(id)
            .await?
            .ok_or(CoreError::NotFound("Ride"))
    }

    /// Standalone guarded decrement. Booking transitions use the transactional
    /// variant on their unit of work instead.
    pub async fn decrement_seats(&self, id: Uuid) -> CoreResult<()> {
        self.rides.decrement_seats(id).await
    }

    pub async fn increment_seats(&self, id: Uuid) -> CoreResult<()> {
        self.rides.increment_seats(id).await
    }
}

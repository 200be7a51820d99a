use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;
use crate::booking::{Booking, BookingListing, BookingStatus};
use crate::ride::{Ride, RideSearch};
use crate::user::UserRecord;
use crate::CoreResult;

/// Account storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateKey` when the student id or email is taken.
    async fn insert_user(&self, user: &UserRecord) -> CoreResult<()>;

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<UserRecord>>;
}

/// Ride offers and their remaining capacity.
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn insert_ride(&self, ride: &Ride) -> CoreResult<()>;

    async fn get_ride(&self, id: Uuid) -> CoreResult<Option<Ride>>;

    /// Rides on `search.date` with seats left, earliest departure first.
    async fn search_rides(&self, search: &RideSearch) -> CoreResult<Vec<Ride>>;

    /// Single guarded decrement. `Conflict` when no seat is left, `NotFound` when
    /// the ride does not exist.
    async fn decrement_seats(&self, id: Uuid) -> CoreResult<()>;

    async fn increment_seats(&self, id: Uuid) -> CoreResult<()>;
}

/// Seat requests and the listing joins over them.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    /// Opens a transaction for a lifecycle transition.
    async fn begin(&self) -> CoreResult<Box<dyn BookingUnitOfWork>>;

    /// Bookings on rides owned by `owner_id`, newest first.
    async fn list_for_rider(&self, owner_id: &str) -> CoreResult<Vec<BookingListing>>;

    /// Bookings made by `seater_id`, newest first.
    async fn list_for_seater(&self, seater_id: &str) -> CoreResult<Vec<BookingListing>>;
}

/// One all-or-nothing transaction spanning a booking and its ride.
///
/// Nothing written through a unit of work is visible to others until `commit`.
/// Dropping it without committing discards every write and releases the
/// underlying connection.
#[async_trait]
pub trait BookingUnitOfWork: Send {
    /// Reads the booking and holds it against concurrent transitions until the
    /// transaction ends.
    async fn lock_booking(&mut self, id: Uuid) -> CoreResult<Option<Booking>>;

    async fn set_status(&mut self, id: Uuid, status: BookingStatus) -> CoreResult<()>;

    async fn delete_booking(&mut self, id: Uuid) -> CoreResult<()>;

    /// Same contract as [`RideRepository::decrement_seats`], inside this transaction.
    async fn decrement_seats(&mut self, ride_id: Uuid) -> CoreResult<()>;

    async fn increment_seats(&mut self, ride_id: Uuid) -> CoreResult<()>;

    async fn commit(self: Box<Self>) -> CoreResult<()>;

    async fn rollback(self: Box<Self>) -> CoreResult<()>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> CoreResult<()>;
}

/// Store handles injected into the services. Built once at startup.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub rides: Arc<dyn RideRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository + RideRepository + BookingRepository + StoreHealth + 'static,
    {
        Self {
            users: store.clone(),
            rides: store.clone(),
            bookings: store.clone(),
            health: store,
        }
    }
}

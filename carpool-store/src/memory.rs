//! In-process store with the same transactional contract as Postgres.
//!
//! A unit of work holds the store's mutex for its whole lifetime and writes to a
//! staged copy of the state; `commit` swaps the copy in. Transactions are fully
//! serialized, which is stronger than the row locking the Postgres store relies
//! on. Used for local runs without a database and for tests.
//!
//! Staging clones every user, ride, and booking, so each transition costs time and
//! memory linear in the size of the store.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use carpool_core::booking::{Booking, BookingListing, BookingStatus};
use carpool_core::repository::{
    BookingRepository, BookingUnitOfWork, RideRepository, StoreHealth, UserRepository,
};
use carpool_core::ride::{Ride, RideSearch};
use carpool_core::user::UserRecord;
use carpool_core::{CoreError, CoreResult};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<String, UserRecord>,
    rides: HashMap<Uuid, Ride>,
    bookings: HashMap<Uuid, Booking>,
}

impl MemoryState {
    fn decrement(&mut self, ride_id: Uuid) -> CoreResult<()> {
        let ride = self.rides.get_mut(&ride_id).ok_or(CoreError::NotFound("Ride"))?;
        if ride.seats_available <= 0 {
            return Err(CoreError::Conflict("No seats available".into()));
        }
        ride.seats_available -= 1;
        Ok(())
    }

    fn increment(&mut self, ride_id: Uuid) -> CoreResult<()> {
        let ride = self.rides.get_mut(&ride_id).ok_or(CoreError::NotFound("Ride"))?;
        ride.seats_available += 1;
        Ok(())
    }

    fn listings<F>(&self, keep: F) -> Vec<BookingListing>
    where
        F: Fn(&Booking, &Ride) -> bool,
    {
        let mut rows: Vec<BookingListing> = self
            .bookings
            .values()
            .filter_map(|b| self.rides.get(&b.ride_id).map(|r| (b, r)))
            .filter(|&(b, r)| keep(b, r))
            .map(|(b, r)| BookingListing {
                booking: b.clone(),
                ride_source: Some(r.source.clone()),
                rider_name: Some(r.rider_name.clone()),
                rider_phone: Some(r.phone_no.clone()),
            })
            .collect();
        rows.sort_by(|a, b| b.booking.booking_time.cmp(&a.booking.booking_time));
        rows
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &UserRecord) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        if state.users.contains_key(&user.student_id) {
            return Err(CoreError::DuplicateKey("users_pkey".into()));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(CoreError::DuplicateKey("users_email_key".into()));
        }
        state.users.insert(user.student_id.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<UserRecord>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl RideRepository for MemoryStore {
    async fn insert_ride(&self, ride: &Ride) -> CoreResult<()> {
        self.state.lock().await.rides.insert(ride.id, ride.clone());
        Ok(())
    }

    async fn get_ride(&self, id: Uuid) -> CoreResult<Option<Ride>> {
        Ok(self.state.lock().await.rides.get(&id).cloned())
    }

    async fn search_rides(&self, search: &RideSearch) -> CoreResult<Vec<Ride>> {
        let state = self.state.lock().await;
        let needle = search.destination.as_deref().unwrap_or("");
        let mut rides: Vec<Ride> = state
            .rides
            .values()
            .filter(|r| r.leave_date == search.date && r.seats_available > 0)
            .filter(|r| r.destination_matches(needle))
            .cloned()
            .collect();
        rides.sort_by(|a, b| {
            a.leave_time
                .cmp(&b.leave_time)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(rides)
    }

    async fn decrement_seats(&self, id: Uuid) -> CoreResult<()> {
        self.state.lock().await.decrement(id)
    }

    async fn increment_seats(&self, id: Uuid) -> CoreResult<()> {
        self.state.lock().await.increment(id)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        if !state.rides.contains_key(&booking.ride_id) {
            return Err(CoreError::NotFound("Ride"));
        }
        state.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn begin(&self) -> CoreResult<Box<dyn BookingUnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = (*guard).clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }

    async fn list_for_rider(&self, owner_id: &str) -> CoreResult<Vec<BookingListing>> {
        let state = self.state.lock().await;
        Ok(state.listings(|_, ride| ride.student_id == owner_id))
    }

    async fn list_for_seater(&self, seater_id: &str) -> CoreResult<Vec<BookingListing>> {
        let state = self.state.lock().await;
        Ok(state.listings(|booking, _| booking.seater_student_id == seater_id))
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> CoreResult<()> {
        Ok(())
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl BookingUnitOfWork for MemoryUnitOfWork {
    async fn lock_booking(&mut self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.staged.bookings.get(&id).cloned())
    }

    async fn set_status(&mut self, id: Uuid, status: BookingStatus) -> CoreResult<()> {
        let booking = self.staged.bookings.get_mut(&id).ok_or(CoreError::NotFound("Booking"))?;
        booking.status = status;
        Ok(())
    }

    async fn delete_booking(&mut self, id: Uuid) -> CoreResult<()> {
        self.staged
            .bookings
            .remove(&id)
            .map(|_| ())
            .ok_or(CoreError::NotFound("Booking"))
    }

    async fn decrement_seats(&mut self, ride_id: Uuid) -> CoreResult<()> {
        self.staged.decrement(ride_id)
    }

    async fn increment_seats(&mut self, ride_id: Uuid) -> CoreResult<()> {
        self.staged.increment(ride_id)
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        let MemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn ride(seats: i32) -> Ride {
        Ride {
            id: Uuid::new_v4(),
            student_id: "S1".into(),
            rider_name: "Ana".into(),
            phone_no: "555-0101".into(),
            source: "North Gate".into(),
            destination: "Airport".into(),
            leave_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            leave_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            seats_available: seats,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn guarded_decrement_stops_at_zero() {
        let store = MemoryStore::new();
        let ride = ride(1);
        store.insert_ride(&ride).await.unwrap();

        store.decrement_seats(ride.id).await.unwrap();
        let err = store.decrement_seats(ride.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(store.get_ride(ride.id).await.unwrap().unwrap().seats_available, 0);

        assert!(matches!(
            store.decrement_seats(Uuid::new_v4()).await,
            Err(CoreError::NotFound("Ride"))
        ));
    }

    #[tokio::test]
    async fn dropped_unit_of_work_discards_writes() {
        let store = MemoryStore::new();
        let ride = ride(2);
        store.insert_ride(&ride).await.unwrap();

        {
            let mut uow = store.begin().await.unwrap();
            uow.decrement_seats(ride.id).await.unwrap();
        }
        assert_eq!(store.get_ride(ride.id).await.unwrap().unwrap().seats_available, 2);

        let mut uow = store.begin().await.unwrap();
        uow.decrement_seats(ride.id).await.unwrap();
        uow.commit().await.unwrap();
        assert_eq!(store.get_ride(ride.id).await.unwrap().unwrap().seats_available, 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_duplicate_key() {
        let store = MemoryStore::new();
        let user = UserRecord {
            student_id: "S1".into(),
            full_name: "Ana".into(),
            phone_number: "555".into(),
            email: "a@x.com".into(),
            password_hash: carpool_shared::Masked("hash".into()),
            created_at: Utc::now(),
        };
        store.insert_user(&user).await.unwrap();

        let other = UserRecord { student_id: "S2".into(), ..user.clone() };
        assert!(matches!(store.insert_user(&other).await, Err(CoreError::DuplicateKey(_))));
        assert!(matches!(store.insert_user(&user).await, Err(CoreError::DuplicateKey(_))));
    }
}

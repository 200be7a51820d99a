//! Postgres-backed repositories.

mod rows;
mod seats;

use async_trait::async_trait;
use carpool_core::booking::{Booking, BookingListing, BookingStatus};
use carpool_core::repository::{
    BookingRepository, BookingUnitOfWork, RideRepository, StoreHealth, UserRepository,
};
use carpool_core::ride::{Ride, RideSearch};
use carpool_core::user::UserRecord;
use carpool_core::{CoreError, CoreResult};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use rows::{db_error, BookingListingRow, BookingRow, RideRow, UserRow, BOOKING_COLUMNS, RIDE_COLUMNS};

const LISTING_SELECT: &str = "SELECT b.id, b.ride_id, b.seater_student_id, b.seater_name, b.seater_phone, \
     b.destination, b.leave_date, b.leave_time, b.booking_time, b.status, \
     r.source AS ride_source, r.rider_name AS rider_name, r.phone_no AS rider_phone \
     FROM bookings b JOIN rides r ON r.id = b.ride_id";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn listings(&self, filter: &str, key: &str) -> CoreResult<Vec<BookingListing>> {
        let sql = format!("{} WHERE {} = $1 ORDER BY b.booking_time DESC", LISTING_SELECT, filter);
        let rows = sqlx::query_as::<_, BookingListingRow>(&sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list bookings"))?;

        rows.into_iter().map(BookingListing::try_from).collect()
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: &UserRecord) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (student_id, full_name, phone_number, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&user.student_id)
        .bind(&user.full_name)
        .bind(&user.phone_number)
        .bind(&user.email)
        .bind(user.password_hash.expose())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().unwrap_or("users").to_string();
                    return CoreError::DuplicateKey(constraint);
                }
            }
            db_error("Failed to create user")(e)
        })?;

        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT student_id, full_name, phone_number, email, password_hash, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get user"))?;

        Ok(row.map(UserRecord::from))
    }
}

#[async_trait]
impl RideRepository for PgStore {
    async fn insert_ride(&self, ride: &Ride) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rides (id, student_id, rider_name, phone_no, source, destination,
                               leave_date, leave_time, seats_available, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(ride.id)
        .bind(&ride.student_id)
        .bind(&ride.rider_name)
        .bind(&ride.phone_no)
        .bind(&ride.source)
        .bind(&ride.destination)
        .bind(ride.leave_date)
        .bind(ride.leave_time)
        .bind(ride.seats_available)
        .bind(&ride.note)
        .bind(ride.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create ride"))?;

        Ok(())
    }

    async fn get_ride(&self, id: Uuid) -> CoreResult<Option<Ride>> {
        let sql = format!("SELECT {} FROM rides WHERE id = $1", RIDE_COLUMNS);
        let row = sqlx::query_as::<_, RideRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get ride"))?;

        Ok(row.map(Ride::from))
    }

    async fn search_rides(&self, search: &RideSearch) -> CoreResult<Vec<Ride>> {
        // strpos keeps user input out of LIKE pattern syntax.
        let sql = format!(
            "SELECT {} FROM rides \
             WHERE leave_date = $1 \
               AND seats_available > 0 \
               AND ($2::text IS NULL OR strpos(lower(destination), lower($2)) > 0) \
             ORDER BY leave_time ASC, created_at ASC",
            RIDE_COLUMNS
        );
        let rows = sqlx::query_as::<_, RideRow>(&sql)
            .bind(search.date)
            .bind(search.destination.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to search rides"))?;

        Ok(rows.into_iter().map(Ride::from).collect())
    }

    async fn decrement_seats(&self, id: Uuid) -> CoreResult<()> {
        let mut conn = self.pool.acquire().await.map_err(db_error("Failed to acquire connection"))?;
        seats::decrement(&mut conn, id).await
    }

    async fn increment_seats(&self, id: Uuid) -> CoreResult<()> {
        let mut conn = self.pool.acquire().await.map_err(db_error("Failed to acquire connection"))?;
        seats::increment(&mut conn, id).await
    }
}

#[async_trait]
impl BookingRepository for PgStore {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, ride_id, seater_student_id, seater_name, seater_phone,
                                  destination, leave_date, leave_time, booking_time, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(booking.id)
        .bind(booking.ride_id)
        .bind(&booking.seater_student_id)
        .bind(&booking.seater_name)
        .bind(&booking.seater_phone)
        .bind(&booking.destination)
        .bind(booking.leave_date)
        .bind(booking.leave_time)
        .bind(booking.booking_time)
        .bind(booking.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                // The ride was deleted between lookup and insert.
                if db_err.is_foreign_key_violation() {
                    return CoreError::NotFound("Ride");
                }
            }
            db_error("Failed to create booking")(e)
        })?;

        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get booking"))?;

        row.map(Booking::try_from).transpose()
    }

    async fn begin(&self) -> CoreResult<Box<dyn BookingUnitOfWork>> {
        let tx = self.pool.begin().await.map_err(db_error("Failed to begin transaction"))?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn list_for_rider(&self, owner_id: &str) -> CoreResult<Vec<BookingListing>> {
        self.listings("r.student_id", owner_id).await
    }

    async fn list_for_seater(&self, seater_id: &str) -> CoreResult<Vec<BookingListing>> {
        self.listings("b.seater_student_id", seater_id).await
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> CoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error("Health check failed"))?;
        Ok(())
    }
}

/// A Postgres transaction. Dropping it uncommitted rolls back and returns the
/// connection to the pool.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingUnitOfWork for PgUnitOfWork {
    async fn lock_booking(&mut self, id: Uuid) -> CoreResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1 FOR UPDATE", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error("Failed to lock booking"))?;

        row.map(Booking::try_from).transpose()
    }

    async fn set_status(&mut self, id: Uuid, status: BookingStatus) -> CoreResult<()> {
        let result = sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("Failed to update booking status"))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound("Booking"));
        }
        Ok(())
    }

    async fn delete_booking(&mut self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("Failed to delete booking"))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound("Booking"));
        }
        Ok(())
    }

    async fn decrement_seats(&mut self, ride_id: Uuid) -> CoreResult<()> {
        seats::decrement(&mut self.tx, ride_id).await
    }

    async fn increment_seats(&mut self, ride_id: Uuid) -> CoreResult<()> {
        seats::increment(&mut self.tx, ride_id).await
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        self.tx.commit().await.map_err(db_error("Failed to commit transaction"))
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        self.tx.rollback().await.map_err(db_error("Failed to roll back transaction"))
    }
}

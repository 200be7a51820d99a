use carpool_core::booking::{Booking, BookingListing};
use carpool_core::ride::Ride;
use carpool_core::user::UserRecord;
use carpool_core::{CoreError, CoreResult};
use carpool_shared::Masked;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

pub(crate) const RIDE_COLUMNS: &str = "id, student_id, rider_name, phone_no, source, destination, \
     leave_date, leave_time, seats_available, note, created_at";

pub(crate) const BOOKING_COLUMNS: &str = "id, ride_id, seater_student_id, seater_name, seater_phone, \
     destination, leave_date, leave_time, booking_time, status";

/// Maps a driver error to the persistence kind, keeping the detail for logs.
pub(crate) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(error = %e, "{}", context);
        CoreError::PersistenceError(format!("{}: {}", context, e))
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    student_id: String,
    full_name: String,
    phone_number: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            student_id: row.student_id,
            full_name: row.full_name,
            phone_number: row.phone_number,
            email: row.email,
            password_hash: Masked(row.password_hash),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RideRow {
    id: Uuid,
    student_id: String,
    rider_name: String,
    phone_no: String,
    source: String,
    destination: String,
    leave_date: NaiveDate,
    leave_time: NaiveTime,
    seats_available: i32,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RideRow> for Ride {
    fn from(row: RideRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            rider_name: row.rider_name,
            phone_no: row.phone_no,
            source: row.source,
            destination: row.destination,
            leave_date: row.leave_date,
            leave_time: row.leave_time,
            seats_available: row.seats_available,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    id: Uuid,
    ride_id: Uuid,
    seater_student_id: String,
    seater_name: String,
    seater_phone: String,
    destination: Option<String>,
    leave_date: Option<NaiveDate>,
    leave_time: Option<NaiveTime>,
    booking_time: DateTime<Utc>,
    status: String,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> CoreResult<Self> {
        let status = row
            .status
            .parse()
            .map_err(|e| CoreError::PersistenceError(format!("Corrupt booking {}: {}", row.id, e)))?;

        Ok(Self {
            id: row.id,
            ride_id: row.ride_id,
            seater_student_id: row.seater_student_id,
            seater_name: row.seater_name,
            seater_phone: row.seater_phone,
            destination: row.destination,
            leave_date: row.leave_date,
            leave_time: row.leave_time,
            booking_time: row.booking_time,
            status,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingListingRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    ride_source: Option<String>,
    rider_name: Option<String>,
    rider_phone: Option<String>,
}

impl TryFrom<BookingListingRow> for BookingListing {
    type Error = CoreError;

    fn try_from(row: BookingListingRow) -> CoreResult<Self> {
        Ok(Self {
            booking: row.booking.try_into()?,
            ride_source: row.ride_source,
            rider_name: row.rider_name,
            rider_phone: row.rider_phone,
        })
    }
}

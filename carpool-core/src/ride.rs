use carpool_shared::{render, Masked};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frontends send seat counts either as numbers or as the raw text of a form input.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SeatCount {
    Number(i64),
    Text(String),
}

impl SeatCount {
    pub fn value(&self) -> Option<i64> {
        match self {
            SeatCount::Number(n) => Some(*n),
            SeatCount::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRideRequest {
    pub student_id: Option<String>,
    pub rider_name: Option<String>,
    pub phone_no: Option<Masked<String>>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub leave_date: Option<String>,
    pub leave_time: Option<String>,
    pub seats_available: Option<SeatCount>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
    pub id: Uuid,
    pub student_id: String,
    pub rider_name: String,
    pub phone_no: String,
    pub source: String,
    pub destination: String,
    pub leave_date: NaiveDate,
    pub leave_time: NaiveTime,
    pub seats_available: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Ride {
    /// Case-insensitive substring match used by search; an empty needle matches all.
    pub fn destination_matches(&self, needle: &str) -> bool {
        self.destination
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }
}

#[derive(Debug, Clone)]
pub struct RideSearch {
    pub destination: Option<String>,
    pub date: NaiveDate,
}

/// Search result row as sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideSummary {
    pub ride_id: Uuid,
    pub student_id: String,
    pub rider_name: String,
    pub phone_no: String,
    pub source: String,
    pub destination: String,
    pub leave_date: String,
    pub leave_time: String,
    pub seats_available: i32,
    pub note: String,
    pub created_at: String,
}

impl From<Ride> for RideSummary {
    fn from(ride: Ride) -> Self {
        Self {
            ride_id: ride.id,
            student_id: ride.student_id,
            rider_name: ride.rider_name,
            phone_no: ride.phone_no,
            source: ride.source,
            destination: ride.destination,
            leave_date: render::date(Some(ride.leave_date)),
            leave_time: render::time(Some(ride.leave_time)),
            seats_available: ride.seats_available,
            note: render::text(ride.note.as_deref()),
            created_at: render::timestamp(Some(ride.created_at)),
        }
    }
}

use carpool_shared::{render, Masked};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::{CoreError, CoreResult};

/// Status of a seat request. Cancellation is not a status: it deletes the booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
        }
    }

    /// `pending -> accepted`, taking one seat from the ride.
    pub fn accept(self) -> CoreResult<Transition> {
        match self {
            BookingStatus::Pending => Ok(Transition {
                from: self,
                next: Some(BookingStatus::Accepted),
                seats: SeatEffect::Take,
            }),
            BookingStatus::Accepted => Err(CoreError::Conflict("Booking is already accepted".into())),
            BookingStatus::Rejected => Err(CoreError::Conflict("Booking was rejected".into())),
        }
    }

    /// `pending -> rejected`; repeating it on a rejected booking is a no-op.
    pub fn reject(self) -> CoreResult<Transition> {
        match self {
            BookingStatus::Pending | BookingStatus::Rejected => Ok(Transition {
                from: self,
                next: Some(BookingStatus::Rejected),
                seats: SeatEffect::None,
            }),
            BookingStatus::Accepted => Err(CoreError::Conflict(
                "Accepted bookings must be cancelled, not rejected".into(),
            )),
        }
    }

    /// Any status may be cancelled; only an accepted booking holds a seat to give back.
    pub fn cancel(self) -> Transition {
        let seats = match self {
            BookingStatus::Accepted => SeatEffect::Release,
            BookingStatus::Pending | BookingStatus::Rejected => SeatEffect::None,
        };
        Transition { from: self, next: None, seats }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "accepted" => Ok(BookingStatus::Accepted),
            "rejected" => Ok(BookingStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Change to a ride's remaining seats that must commit together with a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatEffect {
    None,
    Take,
    Release,
}

/// Outcome of applying a lifecycle operation to a booking in a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: BookingStatus,
    /// `None` means the booking row is deleted.
    pub next: Option<BookingStatus>,
    pub seats: SeatEffect,
}

impl Transition {
    pub fn writes_status(&self) -> bool {
        matches!(self.next, Some(next) if next != self.from)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub ride_id: Option<String>,
    pub seater_name: Option<String>,
    pub seater_phone: Option<Masked<String>>,
    pub seater_student_id: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub seater_student_id: String,
    pub seater_name: String,
    pub seater_phone: String,
    pub destination: Option<String>,
    pub leave_date: Option<NaiveDate>,
    pub leave_time: Option<NaiveTime>,
    pub booking_time: DateTime<Utc>,
    pub status: BookingStatus,
}

/// A booking joined with the ride columns listings need.
#[derive(Debug, Clone)]
pub struct BookingListing {
    pub booking: Booking,
    pub ride_source: Option<String>,
    pub rider_name: Option<String>,
    pub rider_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderBookingView {
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub seater_student_id: String,
    pub seater_name: String,
    pub seater_phone: String,
    pub destination: String,
    pub date: String,
    pub time: String,
    pub booking_time: String,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeaterBookingView {
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub rider_name: String,
    pub rider_phone: String,
    pub source: String,
    pub destination: String,
    pub date: String,
    pub time: String,
    pub booking_time: String,
    pub status: BookingStatus,
}

impl From<BookingListing> for RiderBookingView {
    fn from(row: BookingListing) -> Self {
        let b = row.booking;
        Self {
            booking_id: b.id,
            ride_id: b.ride_id,
            seater_student_id: b.seater_student_id,
            seater_name: b.seater_name,
            seater_phone: b.seater_phone,
            destination: render::text(b.destination.as_deref()),
            date: render::date(b.leave_date),
            time: render::time(b.leave_time),
            booking_time: render::timestamp(Some(b.booking_time)),
            status: b.status,
        }
    }
}

impl From<BookingListing> for SeaterBookingView {
    fn from(row: BookingListing) -> Self {
        let b = row.booking;
        Self {
            booking_id: b.id,
            ride_id: b.ride_id,
            rider_name: render::text(row.rider_name.as_deref()),
            rider_phone: render::text(row.rider_phone.as_deref()),
            source: render::text(row.ride_source.as_deref()),
            destination: render::text(b.destination.as_deref()),
            date: render::date(b.leave_date),
            time: render::time(b.leave_time),
            booking_time: render::timestamp(Some(b.booking_time)),
            status: b.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_only_from_pending() {
        let t = BookingStatus::Pending.accept().unwrap();
        assert_eq!(t.next, Some(BookingStatus::Accepted));
        assert_eq!(t.seats, SeatEffect::Take);
        assert!(t.writes_status());

        assert!(matches!(BookingStatus::Accepted.accept(), Err(CoreError::Conflict(_))));
        assert!(matches!(BookingStatus::Rejected.accept(), Err(CoreError::Conflict(_))));
    }

    #[test]
    fn reject_is_idempotent_and_never_touches_seats() {
        let first = BookingStatus::Pending.reject().unwrap();
        let again = BookingStatus::Rejected.reject().unwrap();
        assert_eq!(first.seats, SeatEffect::None);
        assert_eq!(again.next, Some(BookingStatus::Rejected));
        assert!(!again.writes_status());

        assert!(matches!(BookingStatus::Accepted.reject(), Err(CoreError::Conflict(_))));
    }

    #[test]
    fn cancel_releases_a_seat_only_when_accepted() {
        assert_eq!(BookingStatus::Accepted.cancel().seats, SeatEffect::Release);
        assert_eq!(BookingStatus::Pending.cancel().seats, SeatEffect::None);
        assert_eq!(BookingStatus::Rejected.cancel().seats, SeatEffect::None);
        assert_eq!(BookingStatus::Pending.cancel().next, None);
    }

    #[test]
    fn status_text_round_trips() {
        for status in [BookingStatus::Pending, BookingStatus::Accepted, BookingStatus::Rejected] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn views_render_missing_snapshot_as_blank() {
        let listing = BookingListing {
            booking: Booking {
                id: Uuid::new_v4(),
                ride_id: Uuid::new_v4(),
                seater_student_id: "S2".into(),
                seater_name: "Ben".into(),
                seater_phone: "555-0102".into(),
                destination: None,
                leave_date: None,
                leave_time: None,
                booking_time: Utc::now(),
                status: BookingStatus::Pending,
            },
            ride_source: None,
            rider_name: Some("Ana".into()),
            rider_phone: None,
        };

        let view = SeaterBookingView::from(listing);
        assert_eq!(view.destination, "");
        assert_eq!(view.date, "");
        assert_eq!(view.time, "");
        assert_eq!(view.source, "");
        assert_eq!(view.rider_phone, "");
        assert_eq!(view.rider_name, "Ana");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["date"], "");
    }

    #[test]
    fn booking_request_hides_phone_from_debug() {
        let req: BookingRequest = serde_json::from_str(
            r#"{"rideId":"r-1","seaterName":"Ben","seaterPhone":"555-0102","seaterStudentId":"S2"}"#,
        )
        .unwrap();

        assert_eq!(req.seater_phone.clone().map(Masked::into_inner).as_deref(), Some("555-0102"));
        assert!(!format!("{:?}", req).contains("555-0102"));
    }
}

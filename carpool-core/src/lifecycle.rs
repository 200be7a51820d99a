//! Booking lifecycle: seat requests and the accept/reject/cancel transitions.
//!
//! Every transition runs in one [`BookingUnitOfWork`]. The booking row is locked
//! first, the status table in [`BookingStatus`] decides the next state and seat
//! effect, and both writes commit together or not at all. The seat write is the
//! store's guarded decrement, so two accepts racing for the last seat cannot both
//! commit: the loser sees `Conflict` and its booking stays pending.

use std::sync::Arc;
use carpool_shared::{render, Masked};
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use crate::booking::{Booking, BookingRequest, BookingStatus, SeatEffect, Transition};
use crate::repository::{BookingRepository, BookingUnitOfWork, RideRepository};
use crate::validate::{optional, parse_id, Required};
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Accept,
    Reject,
    Cancel,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Accept => "accept",
            Operation::Reject => "reject",
            Operation::Cancel => "cancel",
        }
    }
}

/// Applied transition, for callers that want to report what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionReport {
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub transition: Transition,
}

#[derive(Clone)]
pub struct BookingEngine {
    rides: Arc<dyn RideRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl BookingEngine {
    pub fn new(rides: Arc<dyn RideRepository>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { rides, bookings }
    }

    /// Records a pending seat request. The ride must exist; snapshot fields the
    /// client leaves out are copied from it.
    #[instrument(name = "booking::request", skip_all, err(Display))]
    pub async fn request_booking(&self, req: BookingRequest) -> CoreResult<Booking> {
        let mut required = Required::new();
        let ride_id = required.take("rideId", req.ride_id);
        let seater_name = required.take("seaterName", req.seater_name);
        let seater_phone = required.take("seaterPhone", req.seater_phone.map(Masked::into_inner));
        let seater_student_id = required.take("seaterStudentId", req.seater_student_id);
        required.finish()?;

        let ride_id = parse_id(Some(ride_id), "rideId", "Ride")?;
        let ride = self
            .rides
            .get_ride(ride_id)
            .await?
            .ok_or(CoreError::NotFound("Ride"))?;

        let leave_date = match optional(req.date) {
            Some(raw) => Some(
                render::parse_date(&raw)
                    .ok_or_else(|| CoreError::ValidationError("date must be YYYY-MM-DD".into()))?,
            ),
            None => Some(ride.leave_date),
        };
        let leave_time = match optional(req.time) {
            Some(raw) => Some(
                render::parse_time(&raw)
                    .ok_or_else(|| CoreError::ValidationError("time must be HH:MM".into()))?,
            ),
            None => Some(ride.leave_time),
        };

        let booking = Booking {
            id: Uuid::new_v4(),
            ride_id,
            seater_student_id,
            seater_name,
            seater_phone,
            destination: optional(req.destination).or(Some(ride.destination)),
            leave_date,
            leave_time,
            booking_time: Utc::now(),
            status: BookingStatus::Pending,
        };

        self.bookings.insert_booking(&booking).await?;
        info!(booking_id = %booking.id, ride_id = %ride_id, "Booking requested");

        Ok(booking)
    }

    pub async fn accept_booking(&self, booking_id: Uuid) -> CoreResult<TransitionReport> {
        self.transition(booking_id, Operation::Accept).await
    }

    pub async fn reject_booking(&self, booking_id: Uuid) -> CoreResult<TransitionReport> {
        self.transition(booking_id, Operation::Reject).await
    }

    pub async fn cancel_booking(&self, booking_id: Uuid) -> CoreResult<TransitionReport> {
        self.transition(booking_id, Operation::Cancel).await
    }

    #[instrument(
        name = "booking::transition",
        skip(self, op),
        fields(op = op.name()),
        err(Display)
    )]
    async fn transition(&self, booking_id: Uuid, op: Operation) -> CoreResult<TransitionReport> {
        let mut uow = self.bookings.begin().await?;

        match apply(uow.as_mut(), booking_id, op).await {
            Ok(report) => {
                uow.commit().await?;
                info!(
                    booking_id = %report.booking_id,
                    ride_id = %report.ride_id,
                    from = %report.transition.from,
                    to = report.transition.next.map(|s| s.as_str()).unwrap_or("deleted"),
                    seats = ?report.transition.seats,
                    "Booking transition committed"
                );
                Ok(report)
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed; transaction dropped");
                }
                Err(err)
            }
        }
    }
}

async fn apply(
    uow: &mut dyn BookingUnitOfWork,
    booking_id: Uuid,
    op: Operation,
) -> CoreResult<TransitionReport> {
    let booking = uow
        .lock_booking(booking_id)
        .await?
        .ok_or(CoreError::NotFound("Booking"))?;

    let transition = match op {
        Operation::Accept => booking.status.accept()?,
        Operation::Reject => booking.status.reject()?,
        Operation::Cancel => booking.status.cancel(),
    };

    match transition.next {
        None => uow.delete_booking(booking_id).await?,
        Some(next) if transition.writes_status() => uow.set_status(booking_id, next).await?,
        Some(_) => {}
    }

    match transition.seats {
        SeatEffect::Take => uow.decrement_seats(booking.ride_id).await.map_err(|err| match err {
            CoreError::Conflict(_) => CoreError::Conflict("No seats available".into()),
            other => other,
        })?,
        SeatEffect::Release => uow.increment_seats(booking.ride_id).await?,
        SeatEffect::None => {}
    }

    Ok(TransitionReport {
        booking_id,
        ride_id: booking.ride_id,
        transition,
    })
}

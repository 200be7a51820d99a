//! Seat counter writes, shared by the pooled repository and the transactional
//! unit of work. Each write is a single `UPDATE`, so Postgres serializes
//! concurrent writers on the ride row.

use carpool_core::{CoreError, CoreResult};
use sqlx::PgConnection;
use uuid::Uuid;
use super::rows::db_error;

pub(crate) async fn decrement(conn: &mut PgConnection, ride_id: Uuid) -> CoreResult<()> {
    let result = sqlx::query(
        "UPDATE rides SET seats_available = seats_available - 1 \
         WHERE id = $1 AND seats_available > 0",
    )
    .bind(ride_id)
    .execute(&mut *conn)
    .await
    .map_err(db_error("Failed to decrement seats"))?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    if ride_exists(conn, ride_id).await? {
        Err(CoreError::Conflict("No seats available".into()))
    } else {
        Err(CoreError::NotFound("Ride"))
    }
}

pub(crate) async fn increment(conn: &mut PgConnection, ride_id: Uuid) -> CoreResult<()> {
    let result = sqlx::query("UPDATE rides SET seats_available = seats_available + 1 WHERE id = $1")
        .bind(ride_id)
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to increment seats"))?;

    if result.rows_affected() == 0 {
        return Err(CoreError::NotFound("Ride"));
    }
    Ok(())
}

async fn ride_exists(conn: &mut PgConnection, ride_id: Uuid) -> CoreResult<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM rides WHERE id = $1)")
        .bind(ride_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error("Failed to look up ride"))
}

use carebook_core::models::reservation::Reservation;
use eyre::Result;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::{
    gateway::{ReservationFilter, ReservationPatch},
    models::DbReservation,
};

pub async fn insert_reservation(conn: &mut PgConnection, reservation: &Reservation) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO reservations (id, slot_id, client_id, provider_id, status, expires_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(reservation.id)
    .bind(reservation.slot_id)
    .bind(&reservation.client_id)
    .bind(&reservation.provider_id)
    .bind(reservation.status.as_str())
    .bind(reservation.expires_at)
    .bind(reservation.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a ReservationFilter) {
    qb.push(" WHERE TRUE");
    if let Some(id) = filter.id {
        qb.push(" AND id = ").push_bind(id);
    }
    if let Some(provider_id) = &filter.provider_id {
        qb.push(" AND provider_id = ").push_bind(provider_id);
    }
    if let Some(client_id) = &filter.client_id {
        qb.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(before) = filter.expires_before {
        qb.push(" AND expires_at < ").push_bind(before);
    }
}

pub async fn find_reservations(
    conn: &mut PgConnection,
    filter: &ReservationFilter,
) -> Result<Vec<Reservation>> {
    let mut qb = QueryBuilder::new(
        "SELECT id, slot_id, client_id, provider_id, status, expires_at, created_at FROM reservations",
    );
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY created_at ASC, id ASC");

    let rows = qb.build_query_as::<DbReservation>().fetch_all(conn).await?;
    rows.into_iter().map(Reservation::try_from).collect()
}

pub async fn update_reservations(
    conn: &mut PgConnection,
    filter: &ReservationFilter,
    patch: &ReservationPatch,
) -> Result<u64> {
    if patch.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::new("UPDATE reservations SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(status) = patch.status {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
        if let Some(expiry) = patch.expires_at {
            set.push("expires_at = ").push_bind_unseparated(expiry);
        }
    }
    push_filter(&mut qb, filter);

    let result = qb.build().execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn delete_reservations(conn: &mut PgConnection, filter: &ReservationFilter) -> Result<u64> {
    let mut qb = QueryBuilder::new("DELETE FROM reservations");
    push_filter(&mut qb, filter);

    let result = qb.build().execute(conn).await?;
    Ok(result.rows_affected())
}

use carebook_core::models::slot::Slot;
use eyre::Result;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::{
    gateway::{SlotFilter, SlotPatch},
    models::DbSlot,
};

const SLOT_COLUMNS: &str =
    "id, availability_id, provider_id, start_time, end_time, status, hold_expires_at, reservation_id";

pub async fn insert_slot(conn: &mut PgConnection, slot: &Slot) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO slots (id, availability_id, provider_id, start_time, end_time, status, hold_expires_at, reservation_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(slot.id)
    .bind(slot.availability_id)
    .bind(&slot.provider_id)
    .bind(slot.start_time)
    .bind(slot.end_time)
    .bind(slot.status.as_str())
    .bind(slot.hold_expires_at)
    .bind(slot.reservation_id)
    .execute(conn)
    .await?;

    Ok(())
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a SlotFilter) {
    qb.push(" WHERE TRUE");
    if let Some(ids) = &filter.ids {
        qb.push(" AND id = ANY(").push_bind(ids.as_slice()).push(")");
    }
    if let Some(provider_id) = &filter.provider_id {
        qb.push(" AND provider_id = ").push_bind(provider_id);
    }
    if let Some(availability_id) = filter.availability_id {
        qb.push(" AND availability_id = ").push_bind(availability_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(reservation_id) = filter.reservation_id {
        qb.push(" AND reservation_id = ").push_bind(reservation_id);
    }
    if let Some(from) = filter.start_from {
        qb.push(" AND start_time >= ").push_bind(from);
    }
    if let Some(before) = filter.start_before {
        qb.push(" AND start_time < ").push_bind(before);
    }
}

pub async fn find_slots(conn: &mut PgConnection, filter: &SlotFilter) -> Result<Vec<Slot>> {
    let mut qb = QueryBuilder::new(format!("SELECT {SLOT_COLUMNS} FROM slots"));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY start_time ASC, id ASC");

    let rows = qb.build_query_as::<DbSlot>().fetch_all(conn).await?;
    rows.into_iter().map(Slot::try_from).collect()
}

pub async fn update_slots(conn: &mut PgConnection, filter: &SlotFilter, patch: &SlotPatch) -> Result<u64> {
    if patch.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::new("UPDATE slots SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(status) = patch.status {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
        if let Some(expiry) = patch.hold_expires_at {
            set.push("hold_expires_at = ").push_bind_unseparated(expiry);
        }
        if let Some(reservation_id) = patch.reservation_id {
            set.push("reservation_id = ").push_bind_unseparated(reservation_id);
        }
    }
    push_filter(&mut qb, filter);

    let result = qb.build().execute(conn).await?;
    Ok(result.rows_affected())
}

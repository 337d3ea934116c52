use carebook_core::models::availability::Availability;
use eyre::Result;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::{gateway::AvailabilityFilter, models::DbAvailability};

pub async fn insert_availability(conn: &mut PgConnection, availability: &Availability) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO availability (id, provider_id, start_time, end_time, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(availability.id)
    .bind(&availability.provider_id)
    .bind(availability.start_time)
    .bind(availability.end_time)
    .bind(availability.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a AvailabilityFilter) {
    qb.push(" WHERE TRUE");
    if let Some(provider_id) = &filter.provider_id {
        qb.push(" AND provider_id = ").push_bind(provider_id);
    }
    if let Some(start) = filter.start_time {
        qb.push(" AND start_time = ").push_bind(start);
    }
    if let Some(end) = filter.end_time {
        qb.push(" AND end_time = ").push_bind(end);
    }
}

pub async fn find_availability(
    conn: &mut PgConnection,
    filter: &AvailabilityFilter,
) -> Result<Vec<Availability>> {
    let mut qb = QueryBuilder::new(
        "SELECT id, provider_id, start_time, end_time, created_at FROM availability",
    );
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY start_time ASC, end_time ASC");

    let rows = qb.build_query_as::<DbAvailability>().fetch_all(conn).await?;
    Ok(rows.into_iter().map(Availability::from).collect())
}

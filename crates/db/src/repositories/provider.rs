use carebook_core::models::provider::Provider;
use eyre::Result;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::{
    gateway::{ProviderFilter, ProviderPatch},
    models::DbProvider,
};

pub async fn insert_provider(conn: &mut PgConnection, provider: &Provider) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO providers (id, name, created_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(&provider.id)
    .bind(&provider.name)
    .bind(provider.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a ProviderFilter) {
    qb.push(" WHERE TRUE");
    if let Some(id) = &filter.id {
        qb.push(" AND id = ").push_bind(id);
    }
}

pub async fn find_providers(conn: &mut PgConnection, filter: &ProviderFilter) -> Result<Vec<Provider>> {
    let mut qb = QueryBuilder::new("SELECT id, name, created_at FROM providers");
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY id ASC");

    let rows = qb.build_query_as::<DbProvider>().fetch_all(conn).await?;
    Ok(rows.into_iter().map(Provider::from).collect())
}

pub async fn lock_providers(conn: &mut PgConnection, filter: &ProviderFilter) -> Result<Vec<Provider>> {
    let mut qb = QueryBuilder::new("SELECT id, name, created_at FROM providers");
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY id ASC FOR UPDATE");

    let rows = qb.build_query_as::<DbProvider>().fetch_all(conn).await?;
    Ok(rows.into_iter().map(Provider::from).collect())
}

pub async fn update_providers(
    conn: &mut PgConnection,
    filter: &ProviderFilter,
    patch: &ProviderPatch,
) -> Result<u64> {
    let Some(name) = &patch.name else {
        return Ok(0);
    };

    let mut qb = QueryBuilder::new("UPDATE providers SET name = ");
    qb.push_bind(name);
    push_filter(&mut qb, filter);

    let result = qb.build().execute(conn).await?;
    Ok(result.rows_affected())
}

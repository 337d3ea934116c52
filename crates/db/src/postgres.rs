//! PostgreSQL gateway.
//!
//! Each transaction runs at READ COMMITTED with a per-transaction
//! `statement_timeout`. Conditional `UPDATE`/`DELETE` statements re-check
//! their predicate after acquiring the row lock, so of two writers racing
//! on the same row only one sees it still match.

use std::time::Duration;

use async_trait::async_trait;
use carebook_core::models::{
    availability::Availability, provider::Provider, reservation::Reservation, slot::Slot,
};
use eyre::{Result, WrapErr};
use sqlx::Postgres;
use tracing::{debug, info};

use crate::{
    DbPool,
    gateway::{
        AvailabilityFilter, Gateway, ProviderFilter, ProviderPatch, Record, ReservationFilter,
        ReservationPatch, SlotFilter, SlotPatch, Transaction,
    },
    repositories::{availability, provider, reservation, slot},
};

#[derive(Clone)]
pub struct PgGateway {
    pool: DbPool,
    statement_timeout: Duration,
}

impl PgGateway {
    pub fn new(pool: DbPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }
}

impl PgGateway {
    async fn open(&self, read_only: bool) -> Result<PgTransaction> {
        let mut tx = self
            .pool
            .begin()
            .await
            .wrap_err("failed to begin transaction")?;

        if read_only {
            sqlx::query("SET TRANSACTION READ ONLY")
                .execute(&mut *tx)
                .await
                .wrap_err("failed to mark transaction read-only")?;
        }

        // SET does not take bind parameters; the value is an integer we format ourselves.
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .wrap_err("failed to set statement timeout")?;

        Ok(PgTransaction { tx })
    }
}

#[async_trait]
impl Gateway for PgGateway {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        Ok(Box::new(self.open(false).await?))
    }

    async fn begin_read(&self) -> Result<Box<dyn Transaction>> {
        Ok(Box::new(self.open(true).await?))
    }

    async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}

struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn create(&mut self, records: Vec<Record>) -> Result<()> {
        debug!("Inserting {} record(s)", records.len());
        for record in &records {
            match record {
                Record::Provider(p) => provider::insert_provider(&mut self.tx, p).await,
                Record::Availability(a) => availability::insert_availability(&mut self.tx, a).await,
                Record::Slot(s) => slot::insert_slot(&mut self.tx, s).await,
                Record::Reservation(r) => reservation::insert_reservation(&mut self.tx, r).await,
            }
            .wrap_err_with(|| format!("failed to insert {}", record.kind()))?;
        }
        Ok(())
    }

    async fn find_providers(&mut self, filter: &ProviderFilter) -> Result<Vec<Provider>> {
        provider::find_providers(&mut self.tx, filter).await
    }

    async fn lock_providers(&mut self, filter: &ProviderFilter) -> Result<Vec<Provider>> {
        provider::lock_providers(&mut self.tx, filter).await
    }

    async fn find_availability(&mut self, filter: &AvailabilityFilter) -> Result<Vec<Availability>> {
        availability::find_availability(&mut self.tx, filter).await
    }

    async fn find_slots(&mut self, filter: &SlotFilter) -> Result<Vec<Slot>> {
        slot::find_slots(&mut self.tx, filter).await
    }

    async fn find_reservations(&mut self, filter: &ReservationFilter) -> Result<Vec<Reservation>> {
        reservation::find_reservations(&mut self.tx, filter).await
    }

    async fn update_providers(&mut self, filter: &ProviderFilter, patch: &ProviderPatch) -> Result<u64> {
        provider::update_providers(&mut self.tx, filter, patch).await
    }

    async fn update_slots(&mut self, filter: &SlotFilter, patch: &SlotPatch) -> Result<u64> {
        slot::update_slots(&mut self.tx, filter, patch).await
    }

    async fn update_reservations(
        &mut self,
        filter: &ReservationFilter,
        patch: &ReservationPatch,
    ) -> Result<u64> {
        reservation::update_reservations(&mut self.tx, filter, patch).await
    }

    async fn delete_reservations(&mut self, filter: &ReservationFilter) -> Result<u64> {
        reservation::delete_reservations(&mut self.tx, filter).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.wrap_err("failed to commit transaction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::create_test_pool;
    use carebook_core::models::slot::SlotStatus;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use uuid::Uuid;

    async fn seeded_slot(gateway: &PgGateway) -> Slot {
        let provider_id = format!("pg-{}", Uuid::new_v4());
        let start = Utc.with_ymd_and_hms(2030, 1, 7, 9, 0, 0).unwrap();
        let availability = Availability {
            id: Uuid::new_v4(),
            provider_id: provider_id.clone(),
            start_time: start,
            end_time: start + ChronoDuration::minutes(15),
            created_at: Utc::now(),
        };
        let slot = Slot {
            id: Uuid::new_v4(),
            availability_id: availability.id,
            provider_id: provider_id.clone(),
            start_time: start,
            end_time: start + ChronoDuration::minutes(15),
            status: SlotStatus::Available,
            hold_expires_at: None,
            reservation_id: None,
        };

        let mut tx = gateway.begin().await.unwrap();
        tx.create(vec![
            Record::Provider(Provider {
                id: provider_id,
                name: "Postgres Test".into(),
                created_at: Utc::now(),
            }),
            Record::Availability(availability),
            Record::Slot(slot.clone()),
        ])
        .await
        .unwrap();
        tx.commit().await.unwrap();
        slot
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn conditional_update_lets_only_one_writer_win() {
        let gateway = PgGateway::new(create_test_pool().await, Duration::from_secs(5));
        let slot = seeded_slot(&gateway).await;

        let claim = |reservation_id: Uuid| SlotPatch {
            status: Some(SlotStatus::Reserved),
            hold_expires_at: Some(Some(Utc::now())),
            reservation_id: Some(Some(reservation_id)),
        };
        let filter = SlotFilter::by_id(slot.id).with_status(SlotStatus::Available);

        let mut first = gateway.begin().await.unwrap();
        assert_eq!(first.update_slots(&filter, &claim(Uuid::new_v4())).await.unwrap(), 1);
        first.commit().await.unwrap();

        let mut second = gateway.begin().await.unwrap();
        assert_eq!(second.update_slots(&filter, &claim(Uuid::new_v4())).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn dropped_transaction_rolls_back() {
        let gateway = PgGateway::new(create_test_pool().await, Duration::from_secs(5));
        let slot = seeded_slot(&gateway).await;

        let mut tx = gateway.begin().await.unwrap();
        tx.update_slots(&SlotFilter::by_id(slot.id), &SlotPatch {
            status: Some(SlotStatus::Reserved),
            hold_expires_at: Some(Some(Utc::now())),
            reservation_id: Some(Some(Uuid::new_v4())),
        })
        .await
        .unwrap();
        drop(tx);

        let mut tx = gateway.begin().await.unwrap();
        let found = tx.find_slots(&SlotFilter::by_id(slot.id)).await.unwrap();
        assert_eq!(found[0].status, SlotStatus::Available);
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn locked_provider_holds_back_a_second_writer() {
        let gateway = PgGateway::new(create_test_pool().await, Duration::from_secs(5));
        let slot = seeded_slot(&gateway).await;
        let filter = ProviderFilter::by_id(&slot.provider_id);

        let mut first = gateway.begin().await.unwrap();
        assert_eq!(first.lock_providers(&filter).await.unwrap().len(), 1);

        let contender = {
            let gateway = gateway.clone();
            let filter = filter.clone();
            tokio::spawn(async move {
                let mut second = gateway.begin().await.unwrap();
                second.lock_providers(&filter).await.unwrap().len()
            })
        };

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!contender.is_finished());

        first.commit().await.unwrap();
        assert_eq!(contender.await.unwrap(), 1);
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn read_transaction_rejects_writes() {
        let gateway = PgGateway::new(create_test_pool().await, Duration::from_secs(5));
        let slot = seeded_slot(&gateway).await;

        let mut tx = gateway.begin_read().await.unwrap();
        assert_eq!(tx.find_slots(&SlotFilter::by_id(slot.id)).await.unwrap().len(), 1);
        let write = tx
            .update_slots(&SlotFilter::by_id(slot.id), &SlotPatch::release())
            .await;
        assert!(write.is_err());
    }
}

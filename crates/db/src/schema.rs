use eyre::{Result, WrapErr};
use sqlx::{Pool, Postgres};
use tracing::info;

const TABLES: &[(&str, &str)] = &[
    (
        "providers",
        r#"
        CREATE TABLE IF NOT EXISTS providers (
            id VARCHAR(255) PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "availability",
        r#"
        CREATE TABLE IF NOT EXISTS availability (
            id UUID PRIMARY KEY,
            provider_id VARCHAR(255) NOT NULL REFERENCES providers(id),
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_time TIMESTAMP WITH TIME ZONE NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_availability_range CHECK (end_time > start_time),
            CONSTRAINT unique_availability_window UNIQUE (provider_id, start_time, end_time)
        );
        "#,
    ),
    (
        "slots",
        r#"
        CREATE TABLE IF NOT EXISTS slots (
            id UUID PRIMARY KEY,
            availability_id UUID NOT NULL REFERENCES availability(id),
            provider_id VARCHAR(255) NOT NULL REFERENCES providers(id),
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_time TIMESTAMP WITH TIME ZONE NOT NULL,
            status VARCHAR(16) NOT NULL,
            hold_expires_at TIMESTAMP WITH TIME ZONE NULL,
            reservation_id UUID NULL,
            CONSTRAINT valid_slot_range CHECK (end_time > start_time),
            CONSTRAINT valid_slot_status CHECK (status IN ('available', 'reserved', 'confirmed')),
            CONSTRAINT slot_reservation_link CHECK ((status = 'available') = (reservation_id IS NULL)),
            CONSTRAINT unique_provider_slot UNIQUE (provider_id, start_time)
        );
        "#,
    ),
    (
        "reservations",
        r#"
        CREATE TABLE IF NOT EXISTS reservations (
            id UUID PRIMARY KEY,
            slot_id UUID NOT NULL UNIQUE REFERENCES slots(id),
            client_id VARCHAR(255) NOT NULL,
            provider_id VARCHAR(255) NOT NULL REFERENCES providers(id),
            status VARCHAR(16) NOT NULL,
            expires_at TIMESTAMP WITH TIME ZONE NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_reservation_status CHECK (status IN ('reserved', 'confirmed')),
            CONSTRAINT reservation_expiry CHECK ((status = 'reserved') = (expires_at IS NOT NULL))
        );
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_availability_provider_id ON availability(provider_id)",
    "CREATE INDEX IF NOT EXISTS idx_slots_availability_id ON slots(availability_id)",
    "CREATE INDEX IF NOT EXISTS idx_slots_provider_status_start ON slots(provider_id, status, start_time)",
    "CREATE INDEX IF NOT EXISTS idx_reservations_status_expires_at ON reservations(status, expires_at)",
    "CREATE INDEX IF NOT EXISTS idx_reservations_provider_id ON reservations(provider_id)",
    "CREATE INDEX IF NOT EXISTS idx_reservations_client_id ON reservations(client_id)",
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for (table, ddl) in TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .wrap_err_with(|| format!("failed to create table {table}"))?;
    }

    for ddl in INDEXES {
        sqlx::query(ddl).execute(pool).await.wrap_err("failed to create index")?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}

//! Database schema migrations
//!
//! Versioned schema migrations tracked in the `schema_version` table.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - databases in the field already recorded them
//! 2. **Always add new migrations** - append a step and bump [`CURRENT_SCHEMA_VERSION`]
//! 3. **One transaction per step** - the step's statements and its version row
//!    commit together, so a step is either fully applied or not at all
//! 4. **Failures are fatal** - a failing step aborts startup with [`Error::Migration`]

use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i64 = 3;

/// v1: base schema
const V1_BASE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE item_catalog (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        kana TEXT,
        classification TEXT NOT NULL CHECK (classification IN ('ingredient', 'seasoning')),
        category TEXT,
        default_unit TEXT
    )
    "#,
    r#"
    CREATE TABLE locations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        priority INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE inventory_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        catalog_id INTEGER NOT NULL REFERENCES item_catalog (id),
        amount REAL,
        unit TEXT,
        expiration_date TEXT,
        location_id INTEGER NOT NULL REFERENCES locations (id),
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE seasoning_stock (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        catalog_id INTEGER NOT NULL REFERENCES item_catalog (id),
        status TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE recipes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        yield TEXT,
        process TEXT,
        original_process TEXT NOT NULL DEFAULT '',
        original_ingredients TEXT NOT NULL DEFAULT '',
        url TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE recipe_ingredients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        recipe_id INTEGER NOT NULL REFERENCES recipes (id) ON DELETE CASCADE,
        catalog_id INTEGER NOT NULL REFERENCES item_catalog (id),
        unit TEXT,
        amount TEXT NOT NULL DEFAULT '',
        group_name TEXT NOT NULL DEFAULT '',
        details TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE fridge_photos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        image_path TEXT NOT NULL,
        location TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
];

/// v2: default storage locations
const V2_DEFAULT_LOCATIONS: &[&str] = &[
    r#"
    INSERT OR IGNORE INTO locations (name, priority) VALUES
        ('Fridge', 1),
        ('Chilled', 2),
        ('Freezer', 3),
        ('Vegetable Drawer', 4),
        ('Door Pocket', 5),
        ('Other', 6)
    "#,
];

/// v3: lookup indexes for kana matching and foreign-key scans
const V3_LOOKUP_INDEXES: &[&str] = &[
    "CREATE INDEX idx_item_catalog_kana ON item_catalog (kana)",
    "CREATE INDEX idx_inventory_items_catalog_id ON inventory_items (catalog_id)",
    "CREATE INDEX idx_inventory_items_location_id ON inventory_items (location_id)",
    "CREATE INDEX idx_seasoning_stock_catalog_id ON seasoning_stock (catalog_id)",
    "CREATE INDEX idx_recipe_ingredients_recipe_id ON recipe_ingredients (recipe_id)",
    "CREATE INDEX idx_recipe_ingredients_catalog_id ON recipe_ingredients (catalog_id)",
];

fn migration_steps(version: i64) -> &'static [&'static str] {
    match version {
        1 => V1_BASE_SCHEMA,
        2 => V2_DEFAULT_LOCATIONS,
        3 => V3_LOOKUP_INDEXES,
        _ => &[],
    }
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i64> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

/// Apply one step and record it, all inside a single transaction
async fn apply_step(pool: &SqlitePool, version: i64) -> std::result::Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for statement in migration_steps(version) {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    for version in (current_version + 1)..=CURRENT_SCHEMA_VERSION {
        apply_step(pool, version)
            .await
            .map_err(|source| Error::Migration { version, source })?;
        info!("✓ Migration v{} completed", version);
    }

    info!("All migrations completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    // One connection so the in-memory database is shared by every query
    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn table_exists(pool: &SqlitePool, name: &str) -> bool {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
        )
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_schema_version_no_table() {
        let pool = setup_test_db().await;
        let version = get_schema_version(&pool).await.unwrap();
        assert_eq!(version, 0);
    }

    #[tokio::test]
    async fn test_run_migrations_complete_flow() {
        let pool = setup_test_db().await;

        run_migrations(&pool).await.unwrap();

        let version = get_schema_version(&pool).await.unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        for table in [
            "item_catalog",
            "locations",
            "inventory_items",
            "seasoning_stock",
            "recipes",
            "recipe_ingredients",
            "fridge_photos",
        ] {
            assert!(table_exists(&pool, table).await, "{} missing", table);
        }

        let locations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(locations, 6);
    }

    #[tokio::test]
    async fn test_run_migrations_twice_applies_each_step_once() {
        let pool = setup_test_db().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, CURRENT_SCHEMA_VERSION);

        let locations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(locations, 6);
    }

    #[tokio::test]
    async fn test_failed_step_rolls_back_and_is_fatal() {
        let pool = setup_test_db().await;

        // A stray table with the same name makes v1's CREATE TABLE fail
        // after item_catalog has already been created inside the step.
        sqlx::query("CREATE TABLE locations (legacy TEXT)")
            .execute(&pool)
            .await
            .unwrap();

        let err = run_migrations(&pool).await.unwrap_err();
        assert!(matches!(err, Error::Migration { version: 1, .. }));

        assert!(!table_exists(&pool, "item_catalog").await);
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_newer_database_left_untouched() {
        let pool = setup_test_db().await;
        create_schema_version_table(&pool).await.unwrap();
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(CURRENT_SCHEMA_VERSION + 1)
            .execute(&pool)
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();

        assert!(!table_exists(&pool, "item_catalog").await);
    }
}

//! Database initialization, migrations and models

pub mod init;
pub mod migrations;
pub mod models;

pub use init::init_database;
pub use migrations::{run_migrations, CURRENT_SCHEMA_VERSION};

// src/cli/migrate.rs — Database migration command
//
// Migrations also run whenever the database is opened; this command gives
// visibility and a way back.

use rusqlite::Connection;

use crate::infra::config::Config;
use crate::storage::schema;

/// Show migration status, roll back, or run pending migrations.
pub fn run_migrate(config: &Config, status_only: bool, rollback: bool) -> anyhow::Result<()> {
    let db_path = config.db_path();

    if !db_path.exists() && (status_only || rollback) {
        println!("No database found at: {}", db_path.display());
        println!("Run `smart-reminders migrate` to create it.");
        return Ok(());
    }

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(&db_path)?;

    if status_only {
        return show_migration_status(&conn, config);
    }

    if rollback {
        match schema::rollback_last(&conn)? {
            Some(version) => println!("Rolled back migration v{}.", version),
            None => println!("No migrations to roll back."),
        }
        return show_migration_status(&conn, config);
    }

    println!("Running database migrations...");
    schema::run_migrations(&conn)?;
    println!("Migrations complete.");
    show_migration_status(&conn, config)
}

fn show_migration_status(conn: &Connection, config: &Config) -> anyhow::Result<()> {
    let applied = schema::applied_migrations(conn)?;

    println!("Database: {}", config.db_path().display());
    println!(
        "Schema version: {} (latest {})",
        schema::current_version(conn)?,
        schema::latest_version()
    );

    if applied.is_empty() {
        println!("No migrations have been applied.");
        return Ok(());
    }

    println!();
    println!("Applied migrations:");
    for m in applied {
        println!("  v{}: {} (applied {})", m.version, m.name, m.applied_at);
    }
    Ok(())
}

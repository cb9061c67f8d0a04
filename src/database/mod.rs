pub mod decimal;
pub mod models;
pub mod schema;

use crate::error::{Error, Result};

use tracing::{debug, info};

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::sqlite::Sqlite;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/sqlite");

pub type Db = Sqlite;
pub type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

const BUSY_TIMEOUT_MS: u32 = 5000;

// Children must be deleted before their parents, so the
// foreign keys have to be enforced on every pooled connection.
#[derive(Debug)]
struct Pragmas;

impl r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for Pragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        let sql = format!("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};");
        conn.batch_execute(&sql)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn get_connection_pool(database_url: &str, max_size: u32) -> Result<Pool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(Pragmas))
        .build(manager)?;
    Ok(pool)
}

pub fn get_database_version(connection: &mut SqliteConnection) -> Result<String> {
    use self::schema::config_t::dsl::*;

    let sql = config_t
        .filter(section.eq("database"))
        .filter(property.eq("version"))
        .select(value);

    debug!("{:?}", diesel::debug_query::<Db, _>(&sql).to_string());
    let results: Vec<String> = sql.load(connection)?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| Error::Corrupt("missing database version in config_t".into()))
}

pub fn get_database_uuid(connection: &mut SqliteConnection) -> Result<String> {
    use self::schema::config_t::dsl::*;

    let sql = config_t
        .filter(section.eq("database"))
        .filter(property.eq("uuid"))
        .select(value);

    debug!("{:?}", diesel::debug_query::<Db, _>(&sql).to_string());
    let results: Vec<String> = sql.load(connection)?;

    if let Some(existing) = results.into_iter().next() {
        return Ok(existing);
    }
    let my_uuid = uuid::Uuid::new_v4().hyphenated().to_string();
    let sql = diesel::insert_into(config_t).values((
        section.eq("database"),
        property.eq("uuid"),
        value.eq(&my_uuid),
    ));
    debug!("{:?}", diesel::debug_query::<Db, _>(&sql).to_string());
    sql.execute(connection)?;
    Ok(my_uuid)
}

pub fn run_migrations(connection: &mut impl MigrationHarness<Sqlite>) -> Result<()> {
    let pending = connection
        .has_pending_migration(MIGRATIONS)
        .map_err(|e| Error::Migration(e.to_string()))?;
    if pending {
        info!("Applying pending migrations");
        connection
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| Error::Migration(e.to_string()))?;
    }
    Ok(())
}

/// Opens the pool, brings the schema up to date and logs the database identity.
pub fn init(database_url: &str, max_size: u32) -> Result<Pool> {
    let pool = get_connection_pool(database_url, max_size)?;
    let mut connection = pool.get()?;
    run_migrations(&mut *connection)?;
    let uuid = get_database_uuid(&mut connection)?;
    let version = get_database_version(&mut connection)?;
    info!(
        "Opened database {}, version {}, UUID = {}",
        database_url, version, uuid
    );
    Ok(pool)
}

use super::Station;
use crate::database::models::{NewStation, StationRow};
use crate::database::{Db, Pool};
use crate::entries::dao::{delete_entries, ensure_station};
use crate::error::{Error, Result};
use diesel::prelude::*;
use tokio::task;
use tracing::{debug, info};

pub struct Dao {
    pool: Pool,
}

fn valid_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("station name must not be empty".into()));
    }
    Ok(name.to_string())
}

impl Dao {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, station_name: &str) -> Result<Station> {
        use crate::database::schema::stations::dsl::*;
        let station_name = valid_name(station_name)?;
        let mut conn = self.pool.get()?;
        let row = task::spawn_blocking(move || -> Result<StationRow> {
            let sql = diesel::insert_into(stations).values(NewStation {
                name: &station_name,
            });
            debug!("{:?}", diesel::debug_query::<Db, _>(&sql).to_string());
            Ok(sql.returning(StationRow::as_returning()).get_result(&mut conn)?)
        })
        .await??;
        info!("Created station {} ({})", row.name, row.id);
        Ok(row.into())
    }

    pub async fn rename(&self, station: i32, station_name: &str) -> Result<Station> {
        use crate::database::schema::stations::dsl::*;
        let station_name = valid_name(station_name)?;
        let mut conn = self.pool.get()?;
        let row = task::spawn_blocking(move || -> Result<Option<StationRow>> {
            Ok(diesel::update(stations.find(station))
                .set(name.eq(&station_name))
                .returning(StationRow::as_returning())
                .get_result(&mut conn)
                .optional()?)
        })
        .await??
        .ok_or_else(|| Error::station_not_found(station))?;
        info!("Renamed station {} to {}", row.id, row.name);
        Ok(row.into())
    }

    pub async fn get(&self, station: i32) -> Result<Station> {
        use crate::database::schema::stations::dsl::*;
        let mut conn = self.pool.get()?;
        let row = task::spawn_blocking(move || -> Result<Option<StationRow>> {
            Ok(stations
                .find(station)
                .select(StationRow::as_select())
                .first(&mut conn)
                .optional()?)
        })
        .await??;
        row.map(Station::from)
            .ok_or_else(|| Error::station_not_found(station))
    }

    pub async fn list(&self) -> Result<Vec<Station>> {
        use crate::database::schema::stations::dsl::*;
        let mut conn = self.pool.get()?;
        let rows = task::spawn_blocking(move || -> Result<Vec<StationRow>> {
            Ok(stations
                .order(id.asc())
                .select(StationRow::as_select())
                .load(&mut conn)?)
        })
        .await??;
        Ok(rows.into_iter().map(Station::from).collect())
    }

    /// Removes a station together with all of its entries, tanks and remarks.
    pub async fn delete(&self, station: i32) -> Result<()> {
        let mut conn = self.pool.get()?;
        let removed = task::spawn_blocking(move || {
            conn.immediate_transaction::<_, Error, _>(|conn| {
                use crate::database::schema::{daily_entries, stations};
                ensure_station(conn, station)?;
                let entry_ids: Vec<i32> = daily_entries::table
                    .filter(daily_entries::station_id.eq(station))
                    .select(daily_entries::id)
                    .load(conn)?;
                delete_entries(conn, &entry_ids)?;
                diesel::delete(stations::table.find(station)).execute(conn)?;
                Ok(entry_ids.len())
            })
        })
        .await??;
        info!("Deleted station {station} and {removed} daily entries");
        Ok(())
    }
}

use super::{DailyEntry, EntrySubmission, Remark, SummaryFields};
use crate::database::decimal::{from_text, from_text_opt, to_text, to_text_opt};
use crate::database::models::{EntryFields, EntryRow, NewRemark, NewTank, RemarkRow, TankRow};
use crate::database::{schema, Db, Pool};
use crate::error::{Error, Result};
use crate::measurement::{Normalizer, Tank, WaterLevel};
use chrono::NaiveDate;
use diesel::prelude::*;
use std::collections::HashMap;
use tokio::task;
use tracing::{debug, info};

pub struct Dao {
    pool: Pool,
    normalizer: Normalizer,
}

impl Dao {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            normalizer: Normalizer::new(),
        }
    }

    /// Saves summary, tanks and remarks for a station and date atomically.
    ///
    /// Tanks and remarks replace whatever was stored before. Returns the
    /// version the entry is at after the save. Submitting exactly what is
    /// already stored changes nothing, the version included.
    pub async fn upsert_entry(&self, station_id: i32, submission: EntrySubmission) -> Result<i64> {
        submission.validate()?;
        let date = submission.date;
        let tanks: Vec<Tank> = submission
            .tanks
            .iter()
            .map(|reading| self.normalizer.normalize(reading))
            .collect();
        let mut conn = self.pool.get()?;
        let version =
            task::spawn_blocking(move || upsert(&mut conn, station_id, &submission, &tanks)).await??;
        info!("Saved daily entry for station {station_id} on {date}, version {version}");
        Ok(version)
    }

    /// Replaces the remarks of an entry, creating a zeroed entry if needed.
    ///
    /// Returns the entry version, which only moves when the remarks differ.
    pub async fn save_remarks(&self, station_id: i32, date: NaiveDate, texts: Vec<String>) -> Result<i64> {
        let mut conn = self.pool.get()?;
        let count = texts.len();
        let version = task::spawn_blocking(move || {
            conn.immediate_transaction::<_, Error, _>(|conn| {
                ensure_station(conn, station_id)?;
                write_remarks(conn, station_id, date, &texts)
            })
        })
        .await??;
        info!("Saved {count} remarks for station {station_id} on {date}, version {version}");
        Ok(version)
    }

    pub async fn remarks(&self, station_id: i32, date: NaiveDate) -> Result<Vec<Remark>> {
        let mut conn = self.pool.get()?;
        task::spawn_blocking(move || -> Result<Vec<Remark>> {
            let entry = find_entry(&mut conn, station_id, date)?
                .ok_or_else(|| Error::entry_not_found(station_id, date))?;
            load_remarks(&mut conn, entry.id)
        })
        .await?
    }

    pub async fn entry(&self, station_id: i32, date: NaiveDate) -> Result<Option<DailyEntry>> {
        let mut conn = self.pool.get()?;
        task::spawn_blocking(move || -> Result<Option<DailyEntry>> {
            match find_entry(&mut conn, station_id, date)? {
                Some(row) => Ok(assemble(&mut conn, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await?
    }

    /// All entries of a station in chronological order.
    pub async fn history(&self, station_id: i32) -> Result<Vec<DailyEntry>> {
        let mut conn = self.pool.get()?;
        task::spawn_blocking(move || -> Result<Vec<DailyEntry>> {
            use crate::database::schema::daily_entries::dsl;
            ensure_station(&mut conn, station_id)?;
            let sql = dsl::daily_entries
                .filter(dsl::station_id.eq(station_id))
                .order(dsl::date.asc())
                .select(EntryRow::as_select());
            debug!("{:?}", diesel::debug_query::<Db, _>(&sql).to_string());
            let rows = sql.load(&mut conn)?;
            assemble(&mut conn, rows)
        })
        .await?
    }

    pub async fn delete_entry(&self, station_id: i32, date: NaiveDate) -> Result<()> {
        let mut conn = self.pool.get()?;
        task::spawn_blocking(move || {
            conn.immediate_transaction::<_, Error, _>(|conn| {
                let entry = find_entry(conn, station_id, date)?
                    .ok_or_else(|| Error::entry_not_found(station_id, date))?;
                delete_entries(conn, &[entry.id])
            })
        })
        .await??;
        info!("Deleted daily entry for station {station_id} on {date}");
        Ok(())
    }

    /// The latest `limit` entries dated on or before `as_of`, oldest first.
    pub async fn window(&self, station_id: i32, as_of: NaiveDate, limit: usize) -> Result<Vec<DailyEntry>> {
        let mut conn = self.pool.get()?;
        task::spawn_blocking(move || load_window(&mut conn, station_id, as_of, limit)).await?
    }
}

fn upsert(
    conn: &mut SqliteConnection,
    station_id: i32,
    submission: &EntrySubmission,
    tanks: &[Tank],
) -> Result<i64> {
    conn.immediate_transaction::<_, Error, _>(|conn| {
        ensure_station(conn, station_id)?;
        let date = submission.date;
        let fields = entry_fields(station_id, date, &submission.summary, 1)?;
        let new_tanks = tanks
            .iter()
            .enumerate()
            .map(|(i, tank)| new_tank(0, i, tank))
            .collect::<Result<Vec<NewTank>>>()?;

        let (entry, version) = match find_entry(conn, station_id, date)? {
            Some(row) => {
                check_version(station_id, date, submission.expected_version, row.version)?;
                let fields = EntryFields {
                    version: row.version,
                    ..fields
                };
                if stored_fields(&row) == fields
                    && stored_tanks(conn, row.id)? == new_tanks
                    && stored_remark_texts(conn, row.id)? == submission.remarks
                {
                    debug!("Entry for station {station_id} on {date} unchanged");
                    return Ok(row.version);
                }
                let version = row.version + 1;
                update_summary(conn, row.id, &EntryFields { version, ..fields })?;
                (row.id, version)
            }
            None => {
                check_version(station_id, date, submission.expected_version, 0)?;
                (insert_entry(conn, &fields)?, fields.version)
            }
        };
        replace_tanks(conn, entry, new_tanks)?;
        replace_remarks(conn, entry, &submission.remarks)?;
        Ok(version)
    })
}

pub(crate) fn ensure_station(conn: &mut SqliteConnection, station: i32) -> Result<()> {
    use crate::database::schema::stations::dsl::*;
    let found: Option<i32> = stations.find(station).select(id).first(conn).optional()?;
    found
        .map(|_| ())
        .ok_or_else(|| Error::station_not_found(station))
}

fn find_entry(conn: &mut SqliteConnection, station: i32, day: NaiveDate) -> Result<Option<EntryRow>> {
    use crate::database::schema::daily_entries::dsl::*;
    let sql = daily_entries
        .filter(station_id.eq(station))
        .filter(date.eq(day))
        .select(EntryRow::as_select());
    debug!("{:?}", diesel::debug_query::<Db, _>(&sql).to_string());
    Ok(sql.first(conn).optional()?)
}

fn entry_fields(station_id: i32, date: NaiveDate, summary: &SummaryFields, version: i64) -> Result<EntryFields> {
    let text = |v: Option<f64>| to_text(v.unwrap_or(0.0));
    Ok(EntryFields {
        station_id,
        date,
        tfarm_discharge_volume: text(summary.tfarm_discharge_volume)?,
        kigamboni_discharge_volume: text(summary.kigamboni_discharge_volume)?,
        net_delivery_volume_at_20c: text(summary.net_delivery_volume_at_20c)?,
        net_delivery_mass: text(summary.net_delivery_mass)?,
        pump_over_date: summary.pump_over_date,
        prev_volume: text(summary.prev_volume)?,
        op_ullage_volume: text(summary.op_ullage_volume)?,
        version,
    })
}

fn stored_fields(row: &EntryRow) -> EntryFields {
    EntryFields {
        station_id: row.station_id,
        date: row.date,
        tfarm_discharge_volume: row.tfarm_discharge_volume.clone(),
        kigamboni_discharge_volume: row.kigamboni_discharge_volume.clone(),
        net_delivery_volume_at_20c: row.net_delivery_volume_at_20c.clone(),
        net_delivery_mass: row.net_delivery_mass.clone(),
        pump_over_date: row.pump_over_date,
        prev_volume: row.prev_volume.clone(),
        op_ullage_volume: row.op_ullage_volume.clone(),
        version: row.version,
    }
}

fn check_version(station_id: i32, date: NaiveDate, expected: Option<i64>, found: i64) -> Result<()> {
    match expected {
        Some(expected) if expected != found => Err(Error::Conflict {
            station_id,
            date,
            expected,
            found,
        }),
        _ => Ok(()),
    }
}

fn insert_entry(conn: &mut SqliteConnection, fields: &EntryFields) -> Result<i32> {
    use crate::database::schema::daily_entries::dsl::*;
    let sql = diesel::insert_into(daily_entries).values(fields);
    debug!("{:?}", diesel::debug_query::<Db, _>(&sql).to_string());
    Ok(sql.returning(id).get_result(conn)?)
}

// Full last-write-wins update of the summary, a missing pump over date clears it
fn update_summary(conn: &mut SqliteConnection, entry: i32, fields: &EntryFields) -> Result<()> {
    use crate::database::schema::daily_entries::dsl::*;
    diesel::update(daily_entries.find(entry))
        .set(fields)
        .execute(conn)?;
    Ok(())
}

fn bump_version(conn: &mut SqliteConnection, entry: i32, current: i64) -> Result<i64> {
    use crate::database::schema::daily_entries::dsl::*;
    diesel::update(daily_entries.find(entry))
        .set(version.eq(current + 1))
        .execute(conn)?;
    Ok(current + 1)
}

// Saving remarks alone leaves the summary as it is
fn write_remarks(conn: &mut SqliteConnection, station: i32, day: NaiveDate, texts: &[String]) -> Result<i64> {
    match find_entry(conn, station, day)? {
        Some(row) if stored_remark_texts(conn, row.id)? == texts => Ok(row.version),
        Some(row) => {
            let version = bump_version(conn, row.id, row.version)?;
            replace_remarks(conn, row.id, texts)?;
            Ok(version)
        }
        None => {
            let fields = entry_fields(station, day, &SummaryFields::default(), 1)?;
            let entry = insert_entry(conn, &fields)?;
            replace_remarks(conn, entry, texts)?;
            Ok(fields.version)
        }
    }
}

fn new_tank(entry: i32, position: usize, tank: &Tank) -> Result<NewTank> {
    Ok(NewTank {
        entry_id: entry,
        position: position as i32,
        name: tank.name.trim().to_string(),
        status: tank.status.as_str().to_string(),
        level_mm: to_text(tank.level_mm)?,
        volume_m3: to_text_opt(tank.volume_m3)?,
        water_measured: !tank.water_cm.is_not_measured(),
        water_cm: match tank.water_cm {
            WaterLevel::Measured(v) => Some(to_text(v)?),
            _ => None,
        },
        sg: to_text_opt(tank.sg)?,
        temp_c: to_text_opt(tank.temp_c)?,
        vol_at_20c: to_text_opt(tank.vol_at_20c)?,
        mts: to_text_opt(tank.mts)?,
    })
}

// Stored tanks in the shape they were written, detached from their entry
fn stored_tanks(conn: &mut SqliteConnection, entry: i32) -> Result<Vec<NewTank>> {
    use crate::database::schema::tanks::dsl::*;
    let rows: Vec<TankRow> = tanks
        .filter(entry_id.eq(entry))
        .order(position.asc())
        .select(TankRow::as_select())
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|row| NewTank {
            entry_id: 0,
            position: row.position,
            name: row.name,
            status: row.status,
            level_mm: row.level_mm,
            volume_m3: row.volume_m3,
            water_measured: row.water_measured,
            water_cm: row.water_cm,
            sg: row.sg,
            temp_c: row.temp_c,
            vol_at_20c: row.vol_at_20c,
            mts: row.mts,
        })
        .collect())
}

fn replace_tanks(conn: &mut SqliteConnection, entry: i32, rows: Vec<NewTank>) -> Result<()> {
    use crate::database::schema::tanks::dsl::*;
    diesel::delete(tanks.filter(entry_id.eq(entry))).execute(conn)?;
    for row in rows {
        let row = NewTank {
            entry_id: entry,
            ..row
        };
        diesel::insert_into(tanks).values(&row).execute(conn)?;
    }
    Ok(())
}

fn stored_remark_texts(conn: &mut SqliteConnection, entry: i32) -> Result<Vec<String>> {
    Ok(load_remarks(conn, entry)?
        .into_iter()
        .map(|remark| remark.text)
        .collect())
}

fn replace_remarks(conn: &mut SqliteConnection, entry: i32, texts: &[String]) -> Result<()> {
    use crate::database::schema::remarks::dsl::*;
    diesel::delete(remarks.filter(entry_id.eq(entry))).execute(conn)?;
    for (i, remark) in texts.iter().enumerate() {
        let row = NewRemark {
            entry_id: entry,
            position: i as i32,
            text: remark,
        };
        diesel::insert_into(remarks).values(&row).execute(conn)?;
    }
    Ok(())
}

fn load_remarks(conn: &mut SqliteConnection, entry: i32) -> Result<Vec<Remark>> {
    use crate::database::schema::remarks::dsl::*;
    let rows: Vec<RemarkRow> = remarks
        .filter(entry_id.eq(entry))
        .order(position.asc())
        .select(RemarkRow::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(remark_from_row).collect())
}

/// Deletes entries with their tanks and remarks, children first.
pub(crate) fn delete_entries(conn: &mut SqliteConnection, ids: &[i32]) -> Result<()> {
    let tanks = diesel::delete(schema::tanks::table.filter(schema::tanks::entry_id.eq_any(ids.to_vec())))
        .execute(conn)?;
    let remarks =
        diesel::delete(schema::remarks::table.filter(schema::remarks::entry_id.eq_any(ids.to_vec())))
            .execute(conn)?;
    let entries = diesel::delete(schema::daily_entries::table.filter(schema::daily_entries::id.eq_any(ids.to_vec())))
        .execute(conn)?;
    debug!("Deleted {entries} entries, {tanks} tanks, {remarks} remarks");
    Ok(())
}

fn load_window(
    conn: &mut SqliteConnection,
    station: i32,
    as_of: NaiveDate,
    limit: usize,
) -> Result<Vec<DailyEntry>> {
    use crate::database::schema::daily_entries::dsl::*;
    ensure_station(conn, station)?;
    let sql = daily_entries
        .filter(station_id.eq(station))
        .filter(date.le(as_of))
        .order(date.desc())
        .limit(limit as i64)
        .select(EntryRow::as_select());
    debug!("{:?}", diesel::debug_query::<Db, _>(&sql).to_string());
    let mut rows: Vec<EntryRow> = sql.load(conn)?;
    rows.reverse();
    assemble(conn, rows)
}

fn tank_from_row(row: TankRow) -> Result<Tank> {
    let water_cm = match (row.water_measured, row.water_cm) {
        (false, _) => WaterLevel::NotMeasured,
        (true, None) => WaterLevel::MeasuredZero,
        (true, Some(v)) => WaterLevel::Measured(from_text(&v)?),
    };
    Ok(Tank {
        status: row.status.parse()?,
        level_mm: from_text(&row.level_mm)?,
        volume_m3: from_text_opt(row.volume_m3.as_deref())?,
        water_cm,
        sg: from_text_opt(row.sg.as_deref())?,
        temp_c: from_text_opt(row.temp_c.as_deref())?,
        vol_at_20c: from_text_opt(row.vol_at_20c.as_deref())?,
        mts: from_text_opt(row.mts.as_deref())?,
        name: row.name,
    })
}

fn remark_from_row(row: RemarkRow) -> Remark {
    Remark {
        position: row.position,
        text: row.text,
    }
}

// Attaches tanks and remarks to entry rows, keeping the row order.
fn assemble(conn: &mut SqliteConnection, rows: Vec<EntryRow>) -> Result<Vec<DailyEntry>> {
    let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();

    let tank_rows: Vec<TankRow> = schema::tanks::table
        .filter(schema::tanks::entry_id.eq_any(ids.clone()))
        .order((schema::tanks::entry_id.asc(), schema::tanks::position.asc()))
        .select(TankRow::as_select())
        .load(conn)?;
    let remark_rows: Vec<RemarkRow> = schema::remarks::table
        .filter(schema::remarks::entry_id.eq_any(ids))
        .order((schema::remarks::entry_id.asc(), schema::remarks::position.asc()))
        .select(RemarkRow::as_select())
        .load(conn)?;

    let mut tanks: HashMap<i32, Vec<Tank>> = HashMap::new();
    for row in tank_rows {
        tanks.entry(row.entry_id).or_default().push(tank_from_row(row)?);
    }
    let mut remarks: HashMap<i32, Vec<Remark>> = HashMap::new();
    for row in remark_rows {
        remarks.entry(row.entry_id).or_default().push(remark_from_row(row));
    }

    rows.into_iter()
        .map(|row| -> Result<DailyEntry> {
            Ok(DailyEntry {
                station_id: row.station_id,
                date: row.date,
                tfarm_discharge_volume: from_text(&row.tfarm_discharge_volume)?,
                kigamboni_discharge_volume: from_text(&row.kigamboni_discharge_volume)?,
                net_delivery_volume_at_20c: from_text(&row.net_delivery_volume_at_20c)?,
                net_delivery_mass: from_text(&row.net_delivery_mass)?,
                pump_over_date: row.pump_over_date,
                prev_volume: from_text(&row.prev_volume)?,
                op_ullage_volume: from_text(&row.op_ullage_volume)?,
                version: row.version,
                tanks: tanks.remove(&row.id).unwrap_or_default(),
                remarks: remarks.remove(&row.id).unwrap_or_default(),
            })
        })
        .collect()
}

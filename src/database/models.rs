use chrono::NaiveDate;
use diesel::prelude::*;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::database::schema::stations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StationRow {
    pub id: i32,
    pub name: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::stations)]
pub struct NewStation<'a> {
    pub name: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::database::schema::daily_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EntryRow {
    pub id: i32,
    pub station_id: i32,
    pub date: NaiveDate,
    pub tfarm_discharge_volume: String,
    pub kigamboni_discharge_volume: String,
    pub net_delivery_volume_at_20c: String,
    pub net_delivery_mass: String,
    pub pump_over_date: Option<NaiveDate>,
    pub prev_volume: String,
    pub op_ullage_volume: String,
    pub version: i64,
}

// Used both for inserts and for full last-write-wins updates,
// so a missing pump over date must clear the column.
#[derive(Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::daily_entries)]
#[diesel(treat_none_as_null = true)]
#[diesel(treat_none_as_default_value = false)]
pub struct EntryFields {
    pub station_id: i32,
    pub date: NaiveDate,
    pub tfarm_discharge_volume: String,
    pub kigamboni_discharge_volume: String,
    pub net_delivery_volume_at_20c: String,
    pub net_delivery_mass: String,
    pub pump_over_date: Option<NaiveDate>,
    pub prev_volume: String,
    pub op_ullage_volume: String,
    pub version: i64,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::database::schema::tanks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TankRow {
    pub id: i32,
    pub entry_id: i32,
    pub position: i32,
    pub name: String,
    pub status: String,
    pub level_mm: String,
    pub volume_m3: Option<String>,
    pub water_measured: bool,
    pub water_cm: Option<String>,
    pub sg: Option<String>,
    pub temp_c: Option<String>,
    pub vol_at_20c: Option<String>,
    pub mts: Option<String>,
}

// Unmeasured fields are stored as NULL, never as column defaults
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::tanks)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewTank {
    pub entry_id: i32,
    pub position: i32,
    pub name: String,
    pub status: String,
    pub level_mm: String,
    pub volume_m3: Option<String>,
    pub water_measured: bool,
    pub water_cm: Option<String>,
    pub sg: Option<String>,
    pub temp_c: Option<String>,
    pub vol_at_20c: Option<String>,
    pub mts: Option<String>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::database::schema::remarks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RemarkRow {
    pub id: i32,
    pub entry_id: i32,
    pub position: i32,
    pub text: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::remarks)]
pub struct NewRemark<'a> {
    pub entry_id: i32,
    pub position: i32,
    pub text: &'a str,
}

use super::{inventory_trend, kpi_series, quality_data, InventoryPoint, KpiPoint, QualityData};
use super::{INVENTORY_WINDOW, KPI_WINDOW, QUALITY_WINDOW};
use crate::database::Pool;
use crate::entries::dao::Dao as EntryDao;
use crate::error::Result;
use chrono::NaiveDate;
use tracing::debug;

pub struct Dao {
    entries: EntryDao,
}

impl Dao {
    pub fn new(pool: Pool) -> Self {
        Self {
            entries: EntryDao::new(pool),
        }
    }

    pub async fn inventory_trend(&self, station_id: i32, as_of: NaiveDate) -> Result<Vec<InventoryPoint>> {
        let window = self.entries.window(station_id, as_of, INVENTORY_WINDOW).await?;
        let series = inventory_trend(as_of, &window);
        debug!(
            "Inventory trend for station {station_id} as of {as_of}: {} of {} entries",
            series.len(),
            window.len()
        );
        Ok(series)
    }

    pub async fn quality_data(&self, station_id: i32, as_of: NaiveDate) -> Result<QualityData> {
        let window = self.entries.window(station_id, as_of, QUALITY_WINDOW).await?;
        Ok(quality_data(as_of, &window))
    }

    pub async fn kpi_series(&self, station_id: i32, as_of: NaiveDate) -> Result<Vec<KpiPoint>> {
        let window = self.entries.window(station_id, as_of, KPI_WINDOW).await?;
        Ok(kpi_series(as_of, &window))
    }
}

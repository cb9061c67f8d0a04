pub mod analytics;
pub mod database;
pub mod entries;
pub mod error;
pub mod logging;
pub mod measurement;
pub mod stations;
pub mod trends;

pub use error::{Error, Result};

use dotenvy::dotenv;
use std::env;

const DATABASE_URL: &str = "DATABASE_URL";

pub fn get_database_url() -> Result<String> {
    dotenv().ok();
    env::var(DATABASE_URL).map_err(|_| Error::Config(format!("{DATABASE_URL} must be set")))
}

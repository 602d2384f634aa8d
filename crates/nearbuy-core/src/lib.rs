pub mod app_config;
pub mod catalog;
pub mod config;
pub mod geo;
pub mod hours;
pub mod pagination;
pub mod validation;

pub use app_config::{AppConfig, Environment};
pub use catalog::{load_catalog, parse_catalog, CatalogFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{
    distance, filter_and_rank, round_distance, BoundingBox, Coordinate, Located, Ranked,
    DEFAULT_MAX_DISTANCE_KM,
};
pub use hours::{weekly_hours, DayHours, Timing};
pub use pagination::{paginate, Page, DEFAULT_PAGE, DEFAULT_PER_PAGE};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[source] serde_yaml::Error),
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

pub mod geo_config;
pub mod settings;

pub use geo_config::{GeoConfig, GeoConfigBuilder};
pub use settings::{Settings, CONFIG_PATH_ENV};

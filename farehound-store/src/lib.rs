pub mod app_config;
pub mod http_source;

pub use app_config::{Config, SearchPlan};
pub use http_source::HttpFareSource;

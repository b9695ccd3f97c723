use chrono::NaiveDate;
use farehound_catalog::FailurePolicy;
use farehound_core::{AirportCode, CoreError, CoreResult, SearchForm, SearchFormBuilder, TripWindow};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

pub const DEFAULT_ENDPOINT: &str =
    "https://www.southwest.com/flight/search-flight.html?preserveBugFareType=TRUE";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    /// Print the surviving trips as JSON after the counts.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    concat!("farehound/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub origin: String,
    pub destination: String,
    #[serde(default = "default_adults")]
    pub adult_count: u32,
    #[serde(default)]
    pub senior_count: u32,
    #[serde(default = "default_round_trip")]
    pub round_trip: bool,
    #[serde(default = "default_time_of_day")]
    pub outbound_time_of_day: String,
    #[serde(default = "default_time_of_day")]
    pub return_time_of_day: String,
    #[serde(default = "default_fare_type")]
    pub fare_type: String,
    /// ISO weekday numbers, Monday = 1
    pub weekdays: Vec<u32>,
    pub start_offset: i64,
    pub end_offset: i64,
    pub trip_duration: i64,
    pub max_price: Decimal,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Date the offsets count from; today when unset.
    #[serde(default)]
    pub baseline: Option<NaiveDate>,
}

fn default_adults() -> u32 { 1 }
fn default_round_trip() -> bool { true }
fn default_time_of_day() -> String { "ANYTIME".to_string() }
fn default_fare_type() -> String { "DOLLARS".to_string() }

/// Checked search settings, ready to hand to a `TripAssembler`.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub form: SearchFormBuilder,
    pub window: TripWindow,
    pub max_price: Decimal,
    pub failure_policy: FailurePolicy,
}

impl SearchConfig {
    pub fn validate(&self) -> CoreResult<SearchPlan> {
        let origin: AirportCode = self.origin.parse()?;
        let destination: AirportCode = self.destination.parse()?;
        if origin == destination {
            return Err(CoreError::ValidationError(format!(
                "origin and destination are both {}",
                origin
            )));
        }
        if self.max_price < Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "max price must not be negative, got {}",
                self.max_price
            )));
        }

        let window = TripWindow::new(
            &self.weekdays,
            self.start_offset,
            self.end_offset,
            self.trip_duration,
        )?;
        let form = SearchForm::builder(origin, destination)
            .round_trip(self.round_trip)
            .adults(self.adult_count)
            .seniors(self.senior_count)
            .times_of_day(&self.outbound_time_of_day, &self.return_time_of_day)
            .fare_type(&self.fare_type);

        Ok(SearchPlan {
            form,
            window,
            max_price: self.max_price,
            failure_policy: self.failure_policy,
        })
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `FAREHOUND__SEARCH__MAX_PRICE=240`, `FAREHOUND__SEARCH__WEEKDAYS=5,6`
            .add_source(
                config::Environment::with_prefix("FAREHOUND")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("search.weekdays"),
            )
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(contents: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

pub mod document;
pub mod iata;
pub mod search;
pub mod source;

pub use document::{Query, ResultsDocument};
pub use iata::AirportCode;
pub use search::{Direction, SearchForm, SearchFormBuilder, TripWindow};
pub use source::FareSource;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Failed to parse {field} from {raw:?}")]
    ParseError { field: &'static str, raw: String },
    #[error("Invalid state: {0}")]
    StateError(String),
    #[error("Fetch failed: {0}")]
    FetchError(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl CoreError {
    pub fn parse(field: &'static str, raw: impl Into<String>) -> Self {
        Self::ParseError {
            field,
            raw: raw.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use farehound_core::{AirportCode, Direction, SearchForm};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::identity::flight_hash;

/// Price read from a result row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "amount", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FarePrice {
    Available(Decimal),
    /// Row listed fewer than three fare columns; the lowest fare is not sold.
    Unavailable,
}

impl FarePrice {
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            FarePrice::Available(amount) => Some(*amount),
            FarePrice::Unavailable => None,
        }
    }

    /// Amount usable in the catalog: present and above zero.
    pub fn bookable(&self) -> Option<Decimal> {
        self.amount().filter(|amount| *amount > Decimal::ZERO)
    }
}

/// One result row, before form data is attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOffer {
    pub direction: Direction,
    pub price: FarePrice,
    pub flight_numbers: Vec<u32>,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
}

/// A priced single-direction flight option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub direction: Direction,
    pub price: Decimal,
    pub flight_numbers: Vec<u32>,
    pub departure_time: NaiveTime,
    /// Clock time only; whether it falls on the next day is not recorded.
    pub arrival_time: NaiveTime,
    pub layover: bool,
    pub depart_city: AirportCode,
    pub destination_city: AirportCode,
    pub depart_date: NaiveDate,
    pub airline: String,
    pub query_timestamp: DateTime<Utc>,
    /// 1-based position of the date pair this offer was fetched for; 0 until
    /// the assembler stamps it.
    pub trip_index: u32,
    pub identity_hash: String,
}

impl Offer {
    /// Attach form-derived fields to a row. `None` when the row has no
    /// bookable price.
    pub fn from_raw(
        raw: RawOffer,
        form: &SearchForm,
        airline: &str,
        queried_at: DateTime<Utc>,
    ) -> Option<Self> {
        let price = raw.price.bookable()?;
        let (depart_city, destination_city) = form.route_for(raw.direction);
        let identity_hash = flight_hash(
            airline,
            depart_city.as_str(),
            destination_city.as_str(),
            &raw.flight_numbers,
        );

        Some(Self {
            direction: raw.direction,
            price,
            layover: raw.flight_numbers.len() > 1,
            flight_numbers: raw.flight_numbers,
            departure_time: raw.departure_time,
            arrival_time: raw.arrival_time,
            depart_city: depart_city.clone(),
            destination_city: destination_city.clone(),
            depart_date: form.date_for(raw.direction),
            airline: airline.to_string(),
            query_timestamp: queried_at,
            trip_index: 0,
            identity_hash,
        })
    }

    pub fn with_trip_index(mut self, trip_index: u32) -> Self {
        self.trip_index = trip_index;
        self
    }
}

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{AirportCode, CoreError, CoreResult};

/// Date format the booking endpoint expects in its date fields.
pub const FORM_DATE_FORMAT: &str = "%m/%d/%Y";

/// Largest day offset or trip length a [`TripWindow`] accepts, about ten years.
pub const MAX_WINDOW_DAYS: i64 = 3_660;

/// Which leg of a round trip a result table describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Depart,
    Return,
}

impl Direction {
    /// First result table holds departures, any later table holds returns.
    pub fn from_table_index(index: usize) -> Self {
        if index == 0 {
            Direction::Depart
        } else {
            Direction::Return
        }
    }
}

/// One complete submission to the booking search endpoint.
///
/// Values are never edited in place; a search over several date pairs derives
/// a fresh form per pair with [`SearchForm::with_dates`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchForm {
    pub round_trip: bool,
    pub origin: AirportCode,
    pub destination: AirportCode,
    pub outbound_date: NaiveDate,
    pub return_date: NaiveDate,
    pub outbound_time_of_day: String,
    pub return_time_of_day: String,
    pub adult_count: u32,
    pub senior_count: u32,
    pub fare_type: String,
}

impl SearchForm {
    pub fn builder(origin: AirportCode, destination: AirportCode) -> SearchFormBuilder {
        SearchFormBuilder::new(origin, destination)
    }

    /// Copy of this form travelling on other dates
    pub fn with_dates(&self, outbound: NaiveDate, inbound: NaiveDate) -> Self {
        Self {
            outbound_date: outbound,
            return_date: inbound,
            ..self.clone()
        }
    }

    /// (from, to) airports for offers read from the given table
    pub fn route_for(&self, direction: Direction) -> (&AirportCode, &AirportCode) {
        match direction {
            Direction::Depart => (&self.origin, &self.destination),
            Direction::Return => (&self.destination, &self.origin),
        }
    }

    pub fn date_for(&self, direction: Direction) -> NaiveDate {
        match direction {
            Direction::Depart => self.outbound_date,
            Direction::Return => self.return_date,
        }
    }

    /// Field names and values as the endpoint receives them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("twoWayTrip", self.round_trip.to_string()),
            ("originAirport", self.origin.to_string()),
            ("destinationAirport", self.destination.to_string()),
            (
                "outboundDateString",
                self.outbound_date.format(FORM_DATE_FORMAT).to_string(),
            ),
            (
                "returnDateString",
                self.return_date.format(FORM_DATE_FORMAT).to_string(),
            ),
            ("outboundTimeOfDay", self.outbound_time_of_day.clone()),
            ("returnTimeOfDay", self.return_time_of_day.clone()),
            ("adultPassengerCount", self.adult_count.to_string()),
            ("seniorPassengerCount", self.senior_count.to_string()),
            ("fareType", self.fare_type.clone()),
            ("submitButton", "submit".to_string()),
        ]
    }
}

/// Collects the per-search settings; dates are supplied last, per date pair.
#[derive(Debug, Clone)]
pub struct SearchFormBuilder {
    round_trip: bool,
    origin: AirportCode,
    destination: AirportCode,
    outbound_time_of_day: String,
    return_time_of_day: String,
    adult_count: u32,
    senior_count: u32,
    fare_type: String,
}

impl SearchFormBuilder {
    pub fn new(origin: AirportCode, destination: AirportCode) -> Self {
        Self {
            round_trip: true,
            origin,
            destination,
            outbound_time_of_day: "ANYTIME".to_string(),
            return_time_of_day: "ANYTIME".to_string(),
            adult_count: 1,
            senior_count: 0,
            fare_type: "DOLLARS".to_string(),
        }
    }

    pub fn round_trip(mut self, round_trip: bool) -> Self {
        self.round_trip = round_trip;
        self
    }

    pub fn adults(mut self, count: u32) -> Self {
        self.adult_count = count;
        self
    }

    pub fn seniors(mut self, count: u32) -> Self {
        self.senior_count = count;
        self
    }

    pub fn times_of_day(mut self, outbound: impl Into<String>, inbound: impl Into<String>) -> Self {
        self.outbound_time_of_day = outbound.into();
        self.return_time_of_day = inbound.into();
        self
    }

    pub fn fare_type(mut self, fare_type: impl Into<String>) -> Self {
        self.fare_type = fare_type.into();
        self
    }

    pub fn build(&self, outbound: NaiveDate, inbound: NaiveDate) -> SearchForm {
        SearchForm {
            round_trip: self.round_trip,
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            outbound_date: outbound,
            return_date: inbound,
            outbound_time_of_day: self.outbound_time_of_day.clone(),
            return_time_of_day: self.return_time_of_day.clone(),
            adult_count: self.adult_count,
            senior_count: self.senior_count,
            fare_type: self.fare_type.clone(),
        }
    }
}

/// Departure weekdays, day offsets from a baseline date and trip length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripWindow {
    pub weekdays: Vec<Weekday>,
    pub start_offset: i64,
    pub end_offset: i64,
    pub trip_duration: i64,
}

impl TripWindow {
    /// `weekdays` are ISO numbers, Monday = 1 through Sunday = 7.
    pub fn new(
        weekdays: &[u32],
        start_offset: i64,
        end_offset: i64,
        trip_duration: i64,
    ) -> CoreResult<Self> {
        if weekdays.is_empty() {
            return Err(CoreError::ValidationError(
                "at least one departure weekday is required".to_string(),
            ));
        }
        if start_offset > end_offset {
            return Err(CoreError::ValidationError(format!(
                "start offset {} is after end offset {}",
                start_offset, end_offset
            )));
        }
        if let Some(offset) = [start_offset, end_offset]
            .into_iter()
            .find(|offset| !(-MAX_WINDOW_DAYS..=MAX_WINDOW_DAYS).contains(offset))
        {
            return Err(CoreError::ValidationError(format!(
                "day offset {} is beyond {} days",
                offset, MAX_WINDOW_DAYS
            )));
        }
        if trip_duration > MAX_WINDOW_DAYS {
            return Err(CoreError::ValidationError(format!(
                "trip duration {} is beyond {} days",
                trip_duration, MAX_WINDOW_DAYS
            )));
        }
        if trip_duration < 0 {
            return Err(CoreError::ValidationError(format!(
                "trip duration must not be negative, got {}",
                trip_duration
            )));
        }

        let weekdays = weekdays
            .iter()
            .map(|&n| weekday_from_iso(n))
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self {
            weekdays,
            start_offset,
            end_offset,
            trip_duration,
        })
    }
}

pub fn weekday_from_iso(number: u32) -> CoreResult<Weekday> {
    match number {
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        7 => Ok(Weekday::Sun),
        other => Err(CoreError::ValidationError(format!(
            "weekday must be between 1 (Monday) and 7 (Sunday), got {}",
            other
        ))),
    }
}

use chrono::{DateTime, NaiveTime, Utc};
use farehound_core::document::{text_of, Query};
use farehound_core::{CoreError, CoreResult, Direction, ResultsDocument, SearchForm};
use rust_decimal::Decimal;
use scraper::ElementRef;
use tracing::debug;

use crate::models::{FarePrice, Offer, RawOffer};

/// ICAO code stamped on every offer read from these results pages.
pub const AIRLINE_CODE: &str = "SWA";

const CLOCK_FORMAT: &str = "%I:%M %p";
const NEXT_DAY_MARKER: &str = "Next Day";
/// Rows show three fare columns; the third is the cheapest.
const FARE_COLUMNS: usize = 3;

/// Reads priced result rows out of a results page.
///
/// Each qualifying `<tr>` is read in one pass, so the direction, price, flight
/// numbers and both times of an offer always come from the same row.
pub struct OfferExtractor {
    airline: String,
    tables: Query,
    rows: Query,
    prices: Query,
    flight_links: Query,
    depart_cell: Query,
    arrive_cell: Query,
    time_text: Query,
}

impl OfferExtractor {
    pub fn new() -> CoreResult<Self> {
        Ok(Self {
            airline: AIRLINE_CODE.to_string(),
            tables: Query::new("table", Some("searchResultsTable"))?,
            rows: Query::new("tr", None)?,
            prices: Query::new("label", Some("product_price"))?,
            flight_links: Query::new("a", Some("bugLinkText"))?,
            depart_cell: Query::new("td", Some("depart_column"))?,
            arrive_cell: Query::new("td", Some("arrive_column"))?,
            time_text: Query::new("span", Some("bugText"))?,
        })
    }

    /// Offers with a bookable price, stamped with the current time.
    pub fn extract(&self, document: &ResultsDocument, form: &SearchForm) -> CoreResult<Vec<Offer>> {
        self.extract_at(document, form, Utc::now())
    }

    pub fn extract_at(
        &self,
        document: &ResultsDocument,
        form: &SearchForm,
        queried_at: DateTime<Utc>,
    ) -> CoreResult<Vec<Offer>> {
        let rows = self.extract_rows(document)?;
        let row_count = rows.len();

        let offers: Vec<Offer> = rows
            .into_iter()
            .filter_map(|raw| Offer::from_raw(raw, form, &self.airline, queried_at))
            .collect();

        debug!(
            rows = row_count,
            offers = offers.len(),
            dropped = row_count - offers.len(),
            "Extracted offers for {} -> {}",
            form.origin,
            form.destination
        );
        Ok(offers)
    }

    /// Every qualifying row, unavailable prices included.
    ///
    /// A page without result tables yields no rows. Any unreadable price,
    /// flight number or time fails the whole page.
    pub fn extract_rows(&self, document: &ResultsDocument) -> CoreResult<Vec<RawOffer>> {
        let mut rows = Vec::new();

        for (index, table) in document.find_all(&self.tables).into_iter().enumerate() {
            let direction = Direction::from_table_index(index);
            let before = rows.len();

            for row in self.rows.find_all_in(table) {
                if let Some(raw) = self.read_row(row, direction)? {
                    rows.push(raw);
                }
            }

            debug!(table = index, ?direction, rows = rows.len() - before, "Read result table");
        }

        Ok(rows)
    }

    /// `None` when the row carries no price labels.
    fn read_row(&self, row: ElementRef<'_>, direction: Direction) -> CoreResult<Option<RawOffer>> {
        let price_labels = self.prices.find_all_in(row);
        if price_labels.is_empty() {
            return Ok(None);
        }

        let price = if price_labels.len() < FARE_COLUMNS {
            FarePrice::Unavailable
        } else {
            FarePrice::Available(parse_price(&text_of(price_labels[FARE_COLUMNS - 1]))?)
        };

        let flight_numbers = self
            .flight_links
            .find_all_in(row)
            .into_iter()
            .map(|link| parse_flight_number(&text_of(link)))
            .collect::<CoreResult<Vec<_>>>()?;

        let depart_text = self.cell_time(row, &self.depart_cell, "departure_time")?;
        let arrive_text = self.cell_time(row, &self.arrive_cell, "arrival_time")?;

        Ok(Some(RawOffer {
            direction,
            price,
            flight_numbers,
            departure_time: parse_clock("departure_time", &depart_text)?,
            arrival_time: parse_arrival(&arrive_text)?,
        }))
    }

    fn cell_time(&self, row: ElementRef<'_>, cell: &Query, field: &'static str) -> CoreResult<String> {
        cell.find_first_in(row)
            .and_then(|cell| self.time_text.find_first_in(cell))
            .map(text_of)
            .ok_or_else(|| CoreError::parse(field, ""))
    }
}

/// `"$1,089.50"` -> `1089.50`
pub fn parse_price(text: &str) -> CoreResult<Decimal> {
    let cleaned: String = text
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    cleaned
        .trim()
        .parse::<Decimal>()
        .map_err(|_| CoreError::parse("price", text.trim()))
}

/// Leading token of a flight link, e.g. `"1234 Opens a popup"` -> `1234`.
pub fn parse_flight_number(text: &str) -> CoreResult<u32> {
    text.split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| CoreError::parse("flight_number", text.trim()))
}

/// 12-hour clock text such as `"7:05 AM"`; runs of whitespace count as one space.
pub fn parse_clock(field: &'static str, text: &str) -> CoreResult<NaiveTime> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveTime::parse_from_str(&normalized, CLOCK_FORMAT).map_err(|_| CoreError::parse(field, text.trim()))
}

/// Arrival text may carry a "Next Day" marker, which is dropped.
pub fn parse_arrival(text: &str) -> CoreResult<NaiveTime> {
    let stripped = text.replace(NEXT_DAY_MARKER, " ");
    parse_clock("arrival_time", &stripped).map_err(|_| CoreError::parse("arrival_time", text.trim()))
}

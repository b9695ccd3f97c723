use chrono::{NaiveDate, Weekday};
use farehound_core::{CoreError, CoreResult, FareSource, SearchFormBuilder, TripWindow};
use farehound_offer::{Offer, OfferExtractor};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::dates::{generate_dates, trip_dates};
use crate::trip::TripCatalog;

/// What `search` does when one date pair cannot be fetched or extracted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop and return the error; no catalog is kept.
    #[default]
    Abort,
    /// Log it, leave that trip out and continue with the next date pair.
    SkipDate,
}

/// Runs one weekend search session: one fetch per date pair, then a join of
/// departures to returns and optional filtering of the joined trips.
pub struct TripAssembler<S: FareSource> {
    session_id: Uuid,
    source: S,
    form: SearchFormBuilder,
    extractor: OfferExtractor,
    policy: FailurePolicy,
    offers: Option<Vec<Offer>>,
    trips: Option<TripCatalog>,
}

impl<S: FareSource> TripAssembler<S> {
    pub fn new(source: S, form: SearchFormBuilder) -> CoreResult<Self> {
        Ok(Self {
            session_id: Uuid::new_v4(),
            source,
            form,
            extractor: OfferExtractor::new()?,
            policy: FailurePolicy::default(),
            offers: None,
            trips: None,
        })
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn generate_dates(
        weekdays: &[Weekday],
        start_offset: i64,
        end_offset: i64,
        baseline: NaiveDate,
    ) -> Vec<NaiveDate> {
        generate_dates(weekdays, start_offset, end_offset, baseline)
    }

    /// Fetch and extract every date pair in the window, strictly one after
    /// another, replacing any previous catalog.
    ///
    /// Offers are stamped with their pair's 1-based trip index and kept in
    /// trip order, then page order.
    pub fn search(&mut self, window: &TripWindow, baseline: NaiveDate) -> CoreResult<&[Offer]> {
        let span = info_span!("trip_search", session_id = %self.session_id);
        let _guard = span.enter();

        self.offers = None;
        self.trips = None;

        let pairs = trip_dates(window, baseline)?;
        info!(date_pairs = pairs.len(), %baseline, "Starting trip search");

        let mut catalog = Vec::new();
        for (position, (depart, inbound)) in pairs.into_iter().enumerate() {
            let trip_index = trip_index(position)?;
            let form = self.form.build(depart, inbound);

            let offers = match self
                .source
                .fetch(&form)
                .and_then(|document| self.extractor.extract(&document, &form))
            {
                Ok(offers) => offers,
                Err(err) => match self.policy {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::SkipDate => {
                        warn!(trip_index, %depart, %inbound, error = %err, "Skipping date pair");
                        continue;
                    }
                },
            };

            info!(trip_index, %depart, %inbound, offers = offers.len(), "Searched date pair");
            catalog.extend(offers.into_iter().map(|offer| offer.with_trip_index(trip_index)));
        }

        Ok(self.offers.insert(catalog).as_slice())
    }

    /// Offers collected by the last successful `search`.
    pub fn offers(&self) -> CoreResult<&[Offer]> {
        self.offers
            .as_deref()
            .ok_or_else(|| CoreError::StateError("no search has completed".to_string()))
    }

    /// Pair every departure with every return of the same trip.
    pub fn join(&mut self) -> CoreResult<&TripCatalog> {
        let catalog = TripCatalog::join(self.offers()?);
        info!(session_id = %self.session_id, trips = catalog.len(), "Joined trips");
        Ok(self.trips.insert(catalog))
    }

    /// Current trip view: the join result narrowed by any filters applied since.
    pub fn trips(&self) -> CoreResult<&TripCatalog> {
        self.trips
            .as_ref()
            .ok_or_else(|| CoreError::StateError("trips have not been joined".to_string()))
    }

    pub fn filter_by_max_price(&mut self, max_price: Decimal) -> CoreResult<&TripCatalog> {
        if max_price < Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "max price must not be negative, got {}",
                max_price
            )));
        }
        self.narrow("max_price", |trips| trips.filter_by_max_price(max_price))
    }

    pub fn filter_no_layover(&mut self) -> CoreResult<&TripCatalog> {
        self.narrow("no_layover", TripCatalog::filter_no_layover)
    }

    fn narrow(
        &mut self,
        filter: &'static str,
        apply: impl FnOnce(TripCatalog) -> TripCatalog,
    ) -> CoreResult<&TripCatalog> {
        let current = self
            .trips
            .take()
            .ok_or_else(|| CoreError::StateError("trips have not been joined".to_string()))?;
        let before = current.len();
        let narrowed = apply(current);

        info!(session_id = %self.session_id, filter, before, after = narrowed.len(), "Filtered trips");
        Ok(self.trips.insert(narrowed))
    }
}

/// 1-based trip index for the date pair at `position`.
fn trip_index(position: usize) -> CoreResult<u32> {
    position
        .checked_add(1)
        .and_then(|index| u32::try_from(index).ok())
        .ok_or_else(|| {
            CoreError::ValidationError(format!("date pair {} has no u32 trip index", position))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use farehound_core::{ResultsDocument, SearchForm};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::str::FromStr;

    /// Serves canned pages keyed by outbound date and records every form.
    #[derive(Default)]
    struct ScriptedSource {
        pages: HashMap<NaiveDate, String>,
        seen: RefCell<Vec<SearchForm>>,
    }

    impl ScriptedSource {
        fn page(mut self, outbound: NaiveDate, markup: String) -> Self {
            self.pages.insert(outbound, markup);
            self
        }
    }

    impl FareSource for ScriptedSource {
        fn fetch(&self, form: &SearchForm) -> CoreResult<ResultsDocument> {
            self.seen.borrow_mut().push(form.clone());
            self.pages
                .get(&form.outbound_date)
                .map(|markup| ResultsDocument::parse(markup))
                .ok_or_else(|| CoreError::FetchError(format!("no page for {}", form.outbound_date).into()))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dollars(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn row(price: &str, flights: &[u32]) -> String {
        let links: String = flights
            .iter()
            .map(|f| format!(r#"<a class="bugLinkText">{} Opens popup</a>"#, f))
            .collect();
        format!(
            r#"<tr><td class="depart_column"><span class="bugText">6:30 AM</span></td>
               <td class="arrive_column"><span class="bugText">8:05 AM</span></td>
               <td>{}</td>
               <td><label class="product_price">$300</label></td>
               <td><label class="product_price">$200</label></td>
               <td><label class="product_price">{}</label></td></tr>"#,
            links, price
        )
    }

    fn results(depart_rows: &[String], return_rows: &[String]) -> String {
        format!(
            r#"<html><body>
               <table class="searchResultsTable">{}</table>
               <table class="searchResultsTable">{}</table>
               </body></html>"#,
            depart_rows.concat(),
            return_rows.concat()
        )
    }

    fn assembler(source: ScriptedSource) -> TripAssembler<ScriptedSource> {
        let form = SearchForm::builder("DAL".parse().unwrap(), "STL".parse().unwrap());
        TripAssembler::new(source, form).unwrap()
    }

    // Fridays 2024-02-02 and 2024-02-09, two-day trips.
    fn two_fridays() -> TripWindow {
        TripWindow::new(&[5], 28, 39, 2).unwrap()
    }

    #[test]
    fn test_join_before_search_is_state_error() {
        let mut trips = assembler(ScriptedSource::default());

        assert!(matches!(trips.offers(), Err(CoreError::StateError(_))));
        assert!(matches!(trips.join(), Err(CoreError::StateError(_))));
        assert!(matches!(trips.trips(), Err(CoreError::StateError(_))));
        assert!(matches!(
            trips.filter_by_max_price(dollars("100")),
            Err(CoreError::StateError(_))
        ));
        assert!(matches!(trips.filter_no_layover(), Err(CoreError::StateError(_))));
    }

    #[test]
    fn test_search_stamps_trip_index_in_order() {
        let source = ScriptedSource::default()
            .page(
                date(2024, 2, 2),
                results(&[row("$89.50", &[1]), row("$99.00", &[2])], &[row("$64.00", &[3])]),
            )
            .page(date(2024, 2, 9), results(&[row("$70.00", &[4])], &[row("$71.00", &[5])]));
        let mut trips = assembler(source);

        let offers = trips.search(&two_fridays(), date(2024, 1, 1)).unwrap();
        let indexes: Vec<u32> = offers.iter().map(|o| o.trip_index).collect();
        assert_eq!(indexes, vec![1, 1, 1, 2, 2]);
        assert_eq!(offers[0].price, dollars("89.50"));
        assert_eq!(offers[3].depart_date, date(2024, 2, 9));
        assert_eq!(offers[4].depart_date, date(2024, 2, 11));
    }

    #[test]
    fn test_each_pair_gets_its_own_form() {
        let source = ScriptedSource::default()
            .page(date(2024, 2, 2), results(&[], &[]))
            .page(date(2024, 2, 9), results(&[], &[]));
        let mut trips = assembler(source);
        trips.search(&two_fridays(), date(2024, 1, 1)).unwrap();

        let seen = trips.source().seen.borrow();
        let dates: Vec<(NaiveDate, NaiveDate)> =
            seen.iter().map(|f| (f.outbound_date, f.return_date)).collect();
        assert_eq!(
            dates,
            vec![
                (date(2024, 2, 2), date(2024, 2, 4)),
                (date(2024, 2, 9), date(2024, 2, 11)),
            ]
        );
    }

    #[test]
    fn test_join_and_filter_scenario() {
        let source = ScriptedSource::default()
            .page(date(2024, 2, 2), results(&[row("$89.50", &[1])], &[row("$64.00", &[2])]))
            .page(date(2024, 2, 9), results(&[row("$80.00", &[3])], &[row("$75.00", &[4, 5])]));
        let mut trips = assembler(source);
        trips.search(&two_fridays(), date(2024, 1, 1)).unwrap();

        let joined = trips.join().unwrap();
        assert_eq!(joined.len(), 2);

        let cheap = trips.filter_by_max_price(dollars("160")).unwrap();
        let totals: Vec<_> = cheap.iter().map(|t| t.total_price()).collect();
        assert_eq!(totals, vec![Some(dollars("153.50")), Some(dollars("155.00"))]);

        let nonstop = trips.filter_no_layover().unwrap();
        assert_eq!(nonstop.len(), 1);
        assert_eq!(nonstop.as_slice()[0].trip_index(), 1);

        let tighter = trips.filter_by_max_price(dollars("150")).unwrap();
        assert!(tighter.is_empty());

        // Re-joining restores the unfiltered view.
        assert_eq!(trips.join().unwrap().len(), 2);
    }

    #[test]
    fn test_negative_max_price_is_rejected() {
        let source = ScriptedSource::default().page(date(2024, 2, 2), results(&[], &[]));
        let mut trips = assembler(source);
        trips
            .search(&TripWindow::new(&[5], 28, 35, 2).unwrap(), date(2024, 1, 1))
            .unwrap();
        trips.join().unwrap();

        assert!(matches!(
            trips.filter_by_max_price(dollars("-1")),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn test_abort_policy_propagates_fetch_error() {
        let source =
            ScriptedSource::default().page(date(2024, 2, 2), results(&[row("$50", &[1])], &[]));
        let mut trips = assembler(source);

        let err = trips.search(&two_fridays(), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, CoreError::FetchError(_)));
        assert!(trips.offers().is_err());
    }

    #[test]
    fn test_skip_policy_keeps_other_dates() {
        let source =
            ScriptedSource::default().page(date(2024, 2, 9), results(&[row("$50", &[1])], &[]));
        let mut trips = assembler(source).with_policy(FailurePolicy::SkipDate);

        let offers = trips.search(&two_fridays(), date(2024, 1, 1)).unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].trip_index, 2);
    }

    #[test]
    fn test_parse_error_aborts_search() {
        let broken = results(&[row("$50", &[1]).replace("6:30 AM", "dawn")], &[]);
        let source = ScriptedSource::default()
            .page(date(2024, 2, 2), broken)
            .page(date(2024, 2, 9), results(&[], &[]));
        let mut trips = assembler(source);

        let err = trips.search(&two_fridays(), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, CoreError::ParseError { field: "departure_time", .. }));
    }

    #[test]
    fn test_generate_dates_through_assembler() {
        let dates = TripAssembler::<ScriptedSource>::generate_dates(
            &[Weekday::Fri],
            28,
            39,
            date(2024, 1, 1),
        );
        assert_eq!(dates, vec![date(2024, 2, 2), date(2024, 2, 9)]);
    }

    #[test]
    fn test_trip_index_is_one_based_and_checked() {
        assert_eq!(trip_index(0).unwrap(), 1);
        assert_eq!(trip_index(41).unwrap(), 42);
        assert!(matches!(trip_index(usize::MAX), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_empty_window_yields_empty_catalog() {
        let mut trips = assembler(ScriptedSource::default());
        let window = TripWindow::new(&[5], 1, 3, 2).unwrap(); // Jan 2..4, no Friday

        assert!(trips.search(&window, date(2024, 1, 1)).unwrap().is_empty());
        assert!(trips.join().unwrap().is_empty());
    }
}

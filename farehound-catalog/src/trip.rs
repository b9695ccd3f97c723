use std::cmp::Ordering;
use std::collections::BTreeMap;

use farehound_core::Direction;
use farehound_offer::Offer;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

/// A departure leg and a return leg fetched for the same date pair.
///
/// Either leg may be missing when the page for that trip listed only one
/// direction; the total is then absent rather than the other leg's price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripCandidate {
    trip_index: u32,
    depart: Option<Offer>,
    #[serde(rename = "return")]
    return_leg: Option<Offer>,
    total_price: Option<Decimal>,
}

impl TripCandidate {
    pub fn new(trip_index: u32, depart: Option<Offer>, return_leg: Option<Offer>) -> Self {
        let total_price = match (&depart, &return_leg) {
            (Some(out), Some(back)) => Some(out.price + back.price),
            _ => None,
        };
        Self {
            trip_index,
            depart,
            return_leg,
            total_price,
        }
    }

    pub fn trip_index(&self) -> u32 {
        self.trip_index
    }

    pub fn depart(&self) -> Option<&Offer> {
        self.depart.as_ref()
    }

    pub fn return_leg(&self) -> Option<&Offer> {
        self.return_leg.as_ref()
    }

    pub fn total_price(&self) -> Option<Decimal> {
        self.total_price
    }

    pub fn is_complete(&self) -> bool {
        self.depart.is_some() && self.return_leg.is_some()
    }

    /// True only when both legs exist and neither connects.
    pub fn is_nonstop_both_ways(&self) -> bool {
        matches!(
            (&self.depart, &self.return_leg),
            (Some(out), Some(back)) if !out.layover && !back.layover
        )
    }
}

/// Joined trips, optionally narrowed by filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TripCatalog {
    trips: Vec<TripCandidate>,
}

impl TripCatalog {
    /// Outer join of departure offers to return offers on trip index.
    ///
    /// Trip indexes with offers on both sides produce every depart/return
    /// combination; one-sided indexes produce one candidate per offer with
    /// the other leg unset. Output is ordered by trip index, then depart
    /// order, then return order.
    pub fn join(offers: &[Offer]) -> Self {
        let mut by_trip: BTreeMap<u32, (Vec<&Offer>, Vec<&Offer>)> = BTreeMap::new();
        for offer in offers {
            let sides = by_trip.entry(offer.trip_index).or_default();
            match offer.direction {
                Direction::Depart => sides.0.push(offer),
                Direction::Return => sides.1.push(offer),
            }
        }

        let mut trips = Vec::new();
        for (trip_index, (departs, returns)) in by_trip {
            match (departs.is_empty(), returns.is_empty()) {
                (false, false) => {
                    for out in &departs {
                        for back in &returns {
                            trips.push(TripCandidate::new(
                                trip_index,
                                Some((*out).clone()),
                                Some((*back).clone()),
                            ));
                        }
                    }
                }
                (false, true) => {
                    warn!(trip_index, offers = departs.len(), "Trip has no return offers");
                    trips.extend(
                        departs
                            .into_iter()
                            .map(|out| TripCandidate::new(trip_index, Some(out.clone()), None)),
                    );
                }
                (true, false) => {
                    warn!(trip_index, offers = returns.len(), "Trip has no departure offers");
                    trips.extend(
                        returns
                            .into_iter()
                            .map(|back| TripCandidate::new(trip_index, None, Some(back.clone()))),
                    );
                }
                (true, true) => {}
            }
        }

        Self { trips }
    }

    /// Trips whose total is known and at most `max_price`, cheapest first.
    pub fn filter_by_max_price(self, max_price: Decimal) -> Self {
        self.retain_sorted(|trip| trip.total_price.is_some_and(|total| total <= max_price))
    }

    /// Complete trips with no connection on either leg, cheapest first.
    pub fn filter_no_layover(self) -> Self {
        self.retain_sorted(TripCandidate::is_nonstop_both_ways)
    }

    fn retain_sorted(mut self, keep: impl FnMut(&TripCandidate) -> bool) -> Self {
        self.trips.retain(keep);
        self.trips.sort_by(|a, b| by_total_price(a.total_price, b.total_price));
        self
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TripCandidate> {
        self.trips.iter()
    }

    pub fn as_slice(&self) -> &[TripCandidate] {
        &self.trips
    }

    pub fn into_vec(self) -> Vec<TripCandidate> {
        self.trips
    }
}

impl<'a> IntoIterator for &'a TripCatalog {
    type Item = &'a TripCandidate;
    type IntoIter = std::slice::Iter<'a, TripCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.trips.iter()
    }
}

// Absent totals sort after every known total.
fn by_total_price(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

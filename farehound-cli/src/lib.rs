use anyhow::Context;
use chrono::NaiveDate;
use farehound_catalog::{TripAssembler, TripCatalog};
use farehound_core::FareSource;
use farehound_store::SearchPlan;
use serde::Serialize;
use uuid::Uuid;

/// Outcome of one weekend search run.
#[derive(Debug, Serialize)]
pub struct SearchReport {
    pub session_id: Uuid,
    pub baseline: NaiveDate,
    pub offers: usize,
    pub joined: usize,
    pub under_max_price: usize,
    pub nonstop: usize,
    /// Trips that passed both filters, cheapest first
    pub trips: TripCatalog,
}

impl SearchReport {
    pub fn summary(&self) -> String {
        format!(
            "Number of total trip options: {}\n\
             Number of trip options under max price: {}\n\
             Number of trip options under max price with no layovers: {}",
            self.joined, self.under_max_price, self.nonstop
        )
    }
}

/// Search every date pair in the plan's window, join the legs, then apply
/// the price filter followed by the nonstop filter.
pub fn run_search<S: FareSource>(
    source: S,
    plan: &SearchPlan,
    baseline: NaiveDate,
) -> anyhow::Result<SearchReport> {
    let mut assembler =
        TripAssembler::new(source, plan.form.clone())?.with_policy(plan.failure_policy);

    let offers = assembler
        .search(&plan.window, baseline)
        .context("Trip search failed")?
        .len();
    let joined = assembler.join()?.len();
    let under_max_price = assembler.filter_by_max_price(plan.max_price)?.len();
    let nonstop = assembler.filter_no_layover()?.len();

    Ok(SearchReport {
        session_id: assembler.session_id(),
        baseline,
        offers,
        joined,
        under_max_price,
        nonstop,
        trips: assembler.trips()?.clone(),
    })
}

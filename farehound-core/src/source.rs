use crate::{CoreResult, ResultsDocument, SearchForm};

/// Retrieves the results page for one submitted search form.
///
/// Implementations fail with [`crate::CoreError::FetchError`]; nothing above
/// this trait retries.
pub trait FareSource {
    fn fetch(&self, form: &SearchForm) -> CoreResult<ResultsDocument>;
}

impl<T: FareSource + ?Sized> FareSource for &T {
    fn fetch(&self, form: &SearchForm) -> CoreResult<ResultsDocument> {
        (**self).fetch(form)
    }
}

pub mod extractor;
pub mod identity;
pub mod models;

pub use extractor::{OfferExtractor, AIRLINE_CODE};
pub use identity::flight_hash;
pub use models::{FarePrice, Offer, RawOffer};

pub mod assembler;
pub mod dates;
pub mod trip;

pub use assembler::{FailurePolicy, TripAssembler};
pub use dates::{generate_dates, trip_dates};
pub use trip::{TripCandidate, TripCatalog};

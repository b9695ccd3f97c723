use sha1::{Digest, Sha1};

/// Deduplication key for a routing: SHA-1 over airline, cities and flights.
///
/// Not a security credential. Keys must stay equal to those stored by
/// earlier runs.
pub fn flight_hash(airline: &str, depart_city: &str, destination_city: &str, flights: &[u32]) -> String {
    let flights = flights
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join("&");
    let key = format!("{}+{}+{}+{}", airline, depart_city, destination_city, flights);

    hex::encode(Sha1::digest(key.as_bytes()))
}

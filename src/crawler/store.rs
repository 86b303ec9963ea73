use crate::crawler::flight::{Flight, FlightKey};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

/// Best known flight per route and departure day.
///
/// Shared between the search and validation schedulers. Every mutation goes
/// through the map's entry API, so concurrent writers to the same key never
/// lose updates.
#[derive(Debug, Default)]
pub struct FlightStore {
    flights: DashMap<FlightKey, Flight>,
}

impl FlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `candidate` unless the stored flight for its key is valid and
    /// strictly cheaper. Returns whether the candidate was stored.
    pub fn upsert(&self, candidate: Flight) -> bool {
        match self.flights.entry(candidate.key()) {
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get();
                if existing.is_valid && existing.price < candidate.price {
                    return false;
                }
                occupied.insert(candidate);
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(candidate);
                true
            }
        }
    }

    /// Apply a new price to the flight stored under `key`, provided it is
    /// still the fare identified by `booking_token`.
    pub fn update_price(&self, key: &FlightKey, booking_token: &str, price: f64) -> bool {
        match self.flights.get_mut(key) {
            Some(mut flight) if flight.booking_token() == booking_token => {
                match flight.set_price(price) {
                    Ok(()) => true,
                    Err(e) => {
                        debug!("Rejected price update for {}: {}", key, e);
                        false
                    }
                }
            }
            _ => {
                debug!("Skipping price update for replaced entry {}", key);
                false
            }
        }
    }

    /// Flag the flight stored under `key` as no longer bookable, provided it
    /// is still the fare identified by `booking_token`.
    pub fn mark_invalid(&self, key: &FlightKey, booking_token: &str) -> bool {
        match self.flights.get_mut(key) {
            Some(mut flight) if flight.booking_token() == booking_token => {
                flight.is_valid = false;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, key: &FlightKey) -> Option<Flight> {
        self.flights.get(key).map(|flight| flight.clone())
    }

    /// All stored flights ordered by route and departure day.
    pub fn snapshot(&self) -> Vec<Flight> {
        let mut entries: Vec<(FlightKey, Flight)> = self
            .flights
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, flight)| flight).collect()
    }

    pub fn clear(&self) {
        self.flights.clear();
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use std::sync::Arc;

    fn flight(token: &str, from: &str, to: &str, price: f64, day: u32) -> Flight {
        let dep = Local.with_ymd_and_hms(2024, 6, day, 10, 0, 0).earliest().unwrap();
        let arr = Local.with_ymd_and_hms(2024, 6, day, 12, 0, 0).earliest().unwrap();
        Flight::new(token, from, to, price, dep, arr).unwrap()
    }

    #[test]
    fn test_cheaper_candidate_replaces() {
        let store = FlightStore::new();
        assert!(store.upsert(flight("a", "ALA", "TSE", 120.0, 1)));
        assert!(store.upsert(flight("b", "ALA", "TSE", 100.0, 1)));

        let stored = store.get(&flight("x", "ALA", "TSE", 0.0, 1).key()).unwrap();
        assert_eq!(stored.booking_token(), "b");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_more_expensive_candidate_is_rejected() {
        let store = FlightStore::new();
        store.upsert(flight("a", "ALA", "TSE", 100.0, 1));
        assert!(!store.upsert(flight("b", "ALA", "TSE", 120.0, 1)));

        let key = flight("x", "ALA", "TSE", 0.0, 1).key();
        assert_eq!(store.get(&key).unwrap().booking_token(), "a");
    }

    #[test]
    fn test_equal_price_candidate_replaces() {
        let store = FlightStore::new();
        store.upsert(flight("a", "ALA", "TSE", 100.0, 1));
        assert!(store.upsert(flight("b", "ALA", "TSE", 100.0, 1)));
    }

    #[test]
    fn test_invalid_entry_is_always_replaced() {
        let store = FlightStore::new();
        let cheap = flight("a", "ALA", "TSE", 50.0, 1);
        let key = cheap.key();
        store.upsert(cheap);
        assert!(store.mark_invalid(&key, "a"));

        assert!(store.upsert(flight("b", "ALA", "TSE", 500.0, 1)));
        let stored = store.get(&key).unwrap();
        assert_eq!(stored.booking_token(), "b");
        assert!(stored.is_valid);
    }

    #[test]
    fn test_keys_are_per_route_and_day() {
        let store = FlightStore::new();
        store.upsert(flight("a", "ALA", "TSE", 100.0, 1));
        store.upsert(flight("b", "ALA", "TSE", 100.0, 2));
        store.upsert(flight("c", "TSE", "ALA", 100.0, 1));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_updates_ignore_replaced_entries() {
        let store = FlightStore::new();
        let original = flight("a", "ALA", "TSE", 100.0, 1);
        let key = original.key();
        store.upsert(original);
        store.upsert(flight("b", "ALA", "TSE", 90.0, 1));

        assert!(!store.update_price(&key, "a", 10.0));
        assert!(!store.mark_invalid(&key, "a"));
        assert_eq!(store.get(&key).unwrap().price, 90.0);

        assert!(store.update_price(&key, "b", 80.0));
        assert_eq!(store.get(&key).unwrap().price, 80.0);
    }

    #[test]
    fn test_snapshot_is_ordered_and_filters_invalid() {
        let store = FlightStore::new();
        store.upsert(flight("c", "TSE", "ALA", 100.0, 1));
        store.upsert(flight("b", "ALA", "TSE", 100.0, 2));
        let first = flight("a", "ALA", "TSE", 100.0, 1);
        let first_key = first.key();
        store.upsert(first);

        let tokens: Vec<_> = store
            .snapshot()
            .iter()
            .map(|f| f.booking_token().to_string())
            .collect();
        assert_eq!(tokens, vec!["a", "b", "c"]);

        store.mark_invalid(&first_key, "a");
        // Invalid entries stay listed in key order
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(!snapshot[0].is_valid);
        assert!(snapshot[1].is_valid && snapshot[2].is_valid);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_upserts_keep_cheapest() {
        let store = Arc::new(FlightStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.upsert(flight(&format!("t{}", i), "ALA", "TSE", 100.0 + i as f64, 1));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let key = flight("x", "ALA", "TSE", 0.0, 1).key();
        assert_eq!(store.get(&key).unwrap().price, 100.0);
    }
}

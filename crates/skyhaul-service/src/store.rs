//! In-memory fleet and trip history using DashMap.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use skyhaul_core::{Drone, Trip};
use uuid::Uuid;

/// Read access to the current fleet plus the dispatch update.
pub trait FleetProvider: Send + Sync {
    /// Drones in registration order.
    fn snapshot(&self) -> Vec<Drone>;

    /// Mark a drone as out on a trip with the given charge. Returns false if
    /// the drone is unknown.
    fn mark_dispatched(&self, drone_id: &str, battery_percent: f64) -> bool;
}

pub trait TripRepository: Send + Sync {
    fn save(&self, trip: Trip) -> StoredTrip;
    fn get(&self, trip_id: &Uuid) -> Option<StoredTrip>;
    /// Newest first.
    fn list(&self) -> Vec<StoredTrip>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTrip {
    pub trip_id: Uuid,
    pub stored_at: DateTime<Utc>,
    pub trip: Trip,
}

#[derive(Debug, Clone)]
struct FleetEntry {
    seq: u64,
    drone: Drone,
}

/// Fleet keyed by drone id.
#[derive(Debug, Default)]
pub struct InMemoryFleet {
    drones: DashMap<String, FleetEntry>,
    counter: AtomicU64,
}

impl InMemoryFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drones(drones: impl IntoIterator<Item = Drone>) -> Self {
        let fleet = Self::new();
        for drone in drones {
            fleet.upsert(drone);
        }
        fleet
    }

    /// Insert or replace a drone. A replaced drone keeps its position.
    pub fn upsert(&self, drone: Drone) {
        let id = drone.drone_id.clone();
        self.drones
            .entry(id)
            .and_modify(|entry| entry.drone = drone.clone())
            .or_insert_with(|| FleetEntry {
                seq: self.counter.fetch_add(1, Ordering::SeqCst),
                drone,
            });
    }

    pub fn remove(&self, drone_id: &str) -> Option<Drone> {
        self.drones.remove(drone_id).map(|(_, entry)| entry.drone)
    }

    pub fn get(&self, drone_id: &str) -> Option<Drone> {
        self.drones.get(drone_id).map(|entry| entry.drone.clone())
    }

    /// Return a drone to service.
    pub fn mark_available(&self, drone_id: &str) -> bool {
        match self.drones.get_mut(drone_id) {
            Some(mut entry) => {
                entry.drone.available = true;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.drones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drones.is_empty()
    }
}

impl FleetProvider for InMemoryFleet {
    fn snapshot(&self) -> Vec<Drone> {
        let mut entries: Vec<FleetEntry> = self.drones.iter().map(|r| r.value().clone()).collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(|entry| entry.drone).collect()
    }

    fn mark_dispatched(&self, drone_id: &str, battery_percent: f64) -> bool {
        match self.drones.get_mut(drone_id) {
            Some(mut entry) => {
                entry.drone.available = false;
                if battery_percent.is_finite() {
                    entry.drone.current_battery_percent = battery_percent.clamp(0.0, 100.0);
                }
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTripRepository {
    trips: DashMap<Uuid, (u64, StoredTrip)>,
    counter: AtomicU64,
}

impl InMemoryTripRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

impl TripRepository for InMemoryTripRepository {
    fn save(&self, trip: Trip) -> StoredTrip {
        let stored = StoredTrip {
            trip_id: Uuid::new_v4(),
            stored_at: Utc::now(),
            trip,
        };
        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        self.trips.insert(stored.trip_id, (seq, stored.clone()));
        stored
    }

    fn get(&self, trip_id: &Uuid) -> Option<StoredTrip> {
        self.trips.get(trip_id).map(|r| r.value().1.clone())
    }

    fn list(&self) -> Vec<StoredTrip> {
        let mut entries: Vec<(u64, StoredTrip)> = self.trips.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries.into_iter().map(|(_, stored)| stored).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyhaul_core::{plan, DeliveryRequest, GeoPoint};

    fn sample_trip() -> Trip {
        let deliveries = vec![
            DeliveryRequest::new(1.0, 12.98, 77.60),
            DeliveryRequest::new(1.0, 13.05, 77.70),
        ];
        let fleet = vec![Drone::new("DR-1", 2.0, 80.0)];
        plan(GeoPoint::new(12.9716, 77.5946), &deliveries, &fleet, None)
            .unwrap()
            .into_trip()
            .unwrap()
    }

    #[test]
    fn snapshot_keeps_registration_order() {
        let fleet = InMemoryFleet::with_drones([
            Drone::new("DR-9", 1.0, 90.0),
            Drone::new("DR-1", 1.0, 90.0),
            Drone::new("DR-5", 1.0, 90.0),
        ]);
        fleet.upsert(Drone::new("DR-1", 4.0, 50.0));

        let ids: Vec<String> = fleet.snapshot().into_iter().map(|d| d.drone_id).collect();
        assert_eq!(ids, vec!["DR-9", "DR-1", "DR-5"]);
        assert_eq!(fleet.get("DR-1").unwrap().payload_capacity_kg, 4.0);
    }

    #[test]
    fn dispatch_marks_unavailable_and_records_battery() {
        let fleet = InMemoryFleet::with_drones([Drone::new("DR-1", 1.0, 90.0)]);
        assert!(fleet.mark_dispatched("DR-1", 72.0));
        let drone = fleet.get("DR-1").unwrap();
        assert!(!drone.available);
        assert_eq!(drone.current_battery_percent, 72.0);

        assert!(!fleet.mark_dispatched("DR-404", 50.0));
        assert!(fleet.mark_available("DR-1"));
        assert!(fleet.get("DR-1").unwrap().available);
    }

    #[test]
    fn repository_lists_newest_first() {
        let repo = InMemoryTripRepository::new();
        let first = repo.save(sample_trip());
        let second = repo.save(sample_trip());

        let listed: Vec<Uuid> = repo.list().into_iter().map(|s| s.trip_id).collect();
        assert_eq!(listed, vec![second.trip_id, first.trip_id]);
        assert_eq!(repo.get(&first.trip_id), Some(first));
        assert!(repo.get(&Uuid::new_v4()).is_none());
    }
}

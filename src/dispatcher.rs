use tracing::{debug, error, warn};

use crate::errors::DispatchError;
use crate::heap::{PriorityQueue, SlotHandle};
use crate::rbtree::{NodeHandle, OrderedIndex};
use crate::ride::{Priority, Ride, RideId};

pub const DEFAULT_CAPACITY: usize = 2000;

/// Added to a ride's cost when a longer trip is accepted.
const REPRICE_SURCHARGE: i64 = 10;

pub trait RideService {
    fn insert(&mut self, id: RideId, cost: i64, duration: i64) -> Result<(), DispatchError>;
    fn find(&self, id: RideId) -> Option<Ride>;
    fn range(&self, lo: RideId, hi: RideId) -> Vec<Ride>;
    fn dispatch(&mut self) -> Result<Ride, DispatchError>;
    fn cancel(&mut self, id: RideId) -> Option<Ride>;
    fn update_duration(&mut self, id: RideId, duration: i64) -> Result<TripUpdate, DispatchError>;
}

/// Which branch of the trip update policy was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripUpdate {
    /// Duration lowered in place; cost unchanged.
    Shortened,
    /// Re-booked under the same id with a surcharge.
    Repriced,
    /// Trip grew past twice its length and the ride was cancelled.
    Dropped,
}

#[derive(Debug, Clone, Copy)]
struct Booking {
    ride: Ride,
    slot: Option<SlotHandle>,
}

/// Active rides, indexed by ride number and queued by `(cost, duration)`.
///
/// Each index node records the handle of its queue slot and each queue slot
/// carries the handle of its index node, so either side reaches the other in
/// O(log n). Every operation leaves both sides holding exactly the same set
/// of rides.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    rides: OrderedIndex<RideId, Booking>,
    queue: PriorityQueue<Priority, NodeHandle>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rides: OrderedIndex::with_capacity(capacity),
            queue: PriorityQueue::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.rides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rides.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// The ride the next `dispatch` would hand out.
    pub fn peek_next(&self) -> Option<Ride> {
        let (_, node) = self.queue.peek()?;
        self.rides.get(*node).map(|booking| booking.ride)
    }
}

impl RideService for Dispatcher {
    fn insert(&mut self, id: RideId, cost: i64, duration: i64) -> Result<(), DispatchError> {
        let ride = Ride::new(id, cost, duration);

        let node = self
            .rides
            .insert(id, Booking { ride, slot: None })
            .map_err(|_| {
                warn!(id, "duplicate ride number");
                DispatchError::DuplicateKey(id)
            })?;

        let slot = match self.queue.insert(ride.priority(), node) {
            Ok(slot) => slot,
            Err(err) => {
                self.rides.remove(node);
                warn!(id, cause = %err, "rejecting ride");
                return Err(err.into());
            }
        };

        match self.rides.get_mut(node) {
            Some(booking) => booking.slot = Some(slot),
            None => {
                self.queue.delete_at(slot);
                error!(id, "index node vanished while booking");
                return Err(DispatchError::Unlinked);
            }
        }

        debug!(%ride, "ride booked");
        Ok(())
    }

    fn find(&self, id: RideId) -> Option<Ride> {
        self.rides.find(&id).map(|booking| booking.ride)
    }

    fn range(&self, lo: RideId, hi: RideId) -> Vec<Ride> {
        self.rides
            .range(&lo, &hi)
            .into_iter()
            .map(|(_, booking)| booking.ride)
            .collect()
    }

    fn dispatch(&mut self) -> Result<Ride, DispatchError> {
        let (_, node) = self.queue.extract_min().ok_or(DispatchError::Empty)?;

        let (_, booking) = self.rides.remove(node).ok_or_else(|| {
            error!("queue slot points at a missing ride");
            DispatchError::Unlinked
        })?;

        debug!(ride = %booking.ride, "ride dispatched");
        Ok(booking.ride)
    }

    fn cancel(&mut self, id: RideId) -> Option<Ride> {
        let (_, booking) = self.rides.remove_key(&id)?;

        let dequeued = booking
            .slot
            .and_then(|slot| self.queue.delete_at(slot))
            .is_some();
        if !dequeued {
            error!(id, "cancelled ride had no queue slot");
        }

        debug!(ride = %booking.ride, "ride cancelled");
        Some(booking.ride)
    }

    fn update_duration(&mut self, id: RideId, duration: i64) -> Result<TripUpdate, DispatchError> {
        let node = self.rides.find_handle(&id).ok_or(DispatchError::NotFound(id))?;
        let booking = *self.rides.get(node).ok_or(DispatchError::Unlinked)?;
        let current = booking.ride.duration;

        if duration <= current {
            let slot = booking.slot.ok_or(DispatchError::Unlinked)?;
            let ride = Ride { duration, ..booking.ride };

            // A shorter trip can overtake a same-cost ride above it.
            self.queue
                .rekey(slot, ride.priority())
                .ok_or(DispatchError::Unlinked)?;
            if let Some(booking) = self.rides.get_mut(node) {
                booking.ride = ride;
            }

            debug!(%ride, "trip shortened");
            Ok(TripUpdate::Shortened)
        } else if duration <= current.saturating_mul(2) {
            self.cancel(id);
            let cost = booking.ride.cost.saturating_add(REPRICE_SURCHARGE);
            self.insert(id, cost, duration)?;

            debug!(id, cost, duration, "trip repriced");
            Ok(TripUpdate::Repriced)
        } else {
            self.cancel(id);

            debug!(id, duration, "trip dropped");
            Ok(TripUpdate::Dropped)
        }
    }
}

#[cfg(test)]
impl Dispatcher {
    /// Checks both structures and every link between them.
    fn assert_linked(&self) {
        let count = self.rides.assert_invariants();
        self.queue.assert_invariants();
        assert_eq!(count, self.queue.len(), "index and queue sizes differ");

        for (id, booking) in self.rides.iter() {
            assert_eq!(booking.ride.id, id);
            let slot = booking.slot.expect("ride without a queue slot");
            let node = self.rides.find_handle(&id).expect("ride missing from index");

            assert_eq!(self.queue.get(slot), Some(&node), "slot {id} points elsewhere");
            assert_eq!(self.queue.key(slot), Some(booking.ride.priority()));
        }
    }
}

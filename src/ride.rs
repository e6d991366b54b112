use std::fmt;

use serde::{Deserialize, Serialize};

pub type RideId = i64;

/// Queue ordering key: cheapest first, shorter trip breaks ties.
pub type Priority = (i64, i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ride {
    pub id: RideId,
    pub cost: i64,
    pub duration: i64,
}

impl Ride {
    pub fn new(id: RideId, cost: i64, duration: i64) -> Self {
        Self { id, cost, duration }
    }

    pub fn priority(&self) -> Priority {
        (self.cost, self.duration)
    }
}

impl fmt::Display for Ride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.id, self.cost, self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Ride::new(7, 120, 35).to_string(), "(7,120,35)");
        assert_eq!(Ride::new(-1, 0, 3).to_string(), "(-1,0,3)");
    }

    #[test]
    fn test_priority_orders_by_cost_then_duration() {
        let cheap_long = Ride::new(1, 10, 50);
        let cheap_short = Ride::new(2, 10, 5);
        let pricey = Ride::new(3, 11, 1);

        assert!(cheap_short.priority() < cheap_long.priority());
        assert!(cheap_long.priority() < pricey.priority());
    }
}

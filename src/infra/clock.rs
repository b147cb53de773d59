use chrono::{DateTime, Utc};

/// Source of the current time. Injected into every time-sensitive component
/// so expiry and cool-down logic is deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

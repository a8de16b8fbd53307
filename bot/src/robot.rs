use std::sync::Arc;

use crate::driving::{Car, CarControl, PitResponse, Situation};
use crate::error::DriverError;
use crate::track::Track;

/// Lifecycle hooks a race host calls on each driver it manages.
///
/// The host calls `on_track_changed` before `on_race_start`, then `drive` once
/// per tick until `on_race_end`.
pub trait Robot: Send {
    /// Slot index assigned by the host.
    fn index(&self) -> usize;

    fn name(&self) -> &str;

    fn on_track_changed(&mut self, track: Arc<Track>);

    /// Validate the car and reset per-race state. An error here is fatal for
    /// this car; the host should not start it.
    fn on_race_start(&mut self, car: &Car) -> Result<(), DriverError>;

    fn drive(&mut self, car: &Car, situation: &Situation) -> CarControl;

    fn on_pit_request(&mut self, car: &Car, situation: &Situation) -> PitResponse;

    fn on_race_end(&mut self, car: &Car);
}

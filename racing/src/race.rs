use std::sync::Arc;

use bot::geometry::{heading_vector, left_normal};
use bot::{Car, CarControl, CarSpec, DriverError, PitResponse, Robot, Situation, Track};
use tracing::{debug, info, warn};

use crate::sim::{LineCrossing, SimCar, VehicleParams};

pub const DEFAULT_TICK_HZ: u32 = 50;

/// Grid spacing between consecutive cars, in metres.
const GRID_SPACING: f32 = 8.0;
/// Lateral offset of the staggered grid slots, in metres.
const GRID_STAGGER: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    #[error("car {id} ({name}) failed to start: {source}")]
    Start {
        id: u32,
        name: String,
        #[source]
        source: DriverError,
    },
}

/// When the race stops.
#[derive(Clone, Copy, Debug)]
pub struct RaceLimits {
    pub laps: u32,
    pub max_time: f64,
    /// Ask each driver whether to pit every this many laps.
    pub pit_every: Option<u32>,
}

impl Default for RaceLimits {
    fn default() -> Self {
        Self {
            laps: 3,
            max_time: 300.0,
            pit_every: None,
        }
    }
}

pub struct CarEntry {
    pub id: u32,
    pub robot: Box<dyn Robot>,
    pub car: Car,
    pub sim: SimCar,
    pub laps: u32,
    pub lap_started: f64,
    pub best_lap: Option<f64>,
    pub last_control: CarControl,
    pub reverse_ticks: u64,
}

impl CarEntry {
    /// Line crossings so far. Cars gridded past the line start with one.
    fn reset_laps(&mut self) {
        self.laps = u32::from(self.sim.state.track_pos.segment == 0);
        self.lap_started = 0.0;
        self.best_lap = None;
        self.reverse_ticks = 0;
    }
}

#[derive(Clone, Debug)]
pub struct RaceSummary {
    pub id: u32,
    pub name: String,
    pub laps: u32,
    pub best_lap: Option<f64>,
    pub distance: f32,
    /// Centre-line distance past the line on the current lap.
    pub lap_progress: f32,
    /// Ticks spent in reverse gear.
    pub reverse_ticks: u64,
}

/// Owns the track and every car in the session. Each car entry owns its driver.
pub struct RaceManager {
    track: Arc<Track>,
    spec: CarSpec,
    params: VehicleParams,
    cars: Vec<CarEntry>,
    next_car_id: u32,
    tick: u64,
    time: f64,
    delta_time: f32,
}

impl RaceManager {
    pub fn new(track: Arc<Track>, spec: CarSpec, params: VehicleParams, tick_hz: u32) -> Self {
        Self {
            track,
            spec,
            params,
            cars: Vec::new(),
            next_car_id: 1,
            tick: 0,
            time: 0.0,
            delta_time: 1.0 / tick_hz.max(1) as f32,
        }
    }

    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    pub fn cars(&self) -> &[CarEntry] {
        &self.cars
    }

    pub fn car(&self, id: u32) -> Option<&CarEntry> {
        self.cars.iter().find(|entry| entry.id == id)
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Put a driver on the grid behind the start line and hand it the track.
    pub fn add_car(&mut self, mut robot: Box<dyn Robot>) -> u32 {
        let id = self.next_car_id;
        self.next_car_id += 1;

        let slot = self.cars.len();
        let start = self.track.segment(0);
        let heading = start.start_heading;
        let side = if slot % 2 == 0 { 1.0 } else { -1.0 };
        let position = start.start_mid() - heading_vector(heading) * (GRID_SPACING * slot as f32)
            + left_normal(heading) * (GRID_STAGGER * side);
        let sim = SimCar::new(&self.track, position, heading);

        robot.on_track_changed(self.track.clone());
        let car = Car {
            index: robot.index(),
            spec: self.spec.clone(),
            state: sim.state,
        };
        info!(id, name = robot.name(), slot, "car added");
        let mut entry = CarEntry {
            id,
            robot,
            car,
            sim,
            laps: 0,
            lap_started: 0.0,
            best_lap: None,
            last_control: CarControl::default(),
            reverse_ticks: 0,
        };
        entry.reset_laps();
        self.cars.push(entry);
        id
    }

    /// Release a slot; the driver is dropped with its entry.
    pub fn remove_car(&mut self, id: u32) -> Option<CarEntry> {
        let index = self.cars.iter().position(|entry| entry.id == id)?;
        Some(self.cars.remove(index))
    }

    pub fn start(&mut self) -> Result<(), RaceError> {
        self.tick = 0;
        self.time = 0.0;
        for entry in &mut self.cars {
            entry.robot.on_race_start(&entry.car).map_err(|source| RaceError::Start {
                id: entry.id,
                name: entry.robot.name().to_string(),
                source,
            })?;
            entry.reset_laps();
        }
        info!(track = self.track.name(), cars = self.cars.len(), "race started");
        Ok(())
    }

    /// Advance every car by one tick.
    pub fn step(&mut self, limits: &RaceLimits) {
        let situation = Situation {
            tick: self.tick,
            current_time: self.time,
            delta_time: self.delta_time,
        };

        for entry in &mut self.cars {
            entry.car.state = entry.sim.state;
            let control = entry.robot.drive(&entry.car, &situation);
            if !(control.steer.is_finite()
                && control.accelerator.is_finite()
                && control.brake.is_finite())
            {
                warn!(id = entry.id, ?control, "non-finite control, ignoring");
                continue;
            }
            if control.gear < 0 {
                entry.reverse_ticks += 1;
            }
            entry.last_control = control;

            let crossing = entry.sim.step(
                &control,
                &entry.car.spec,
                &self.params,
                &self.track,
                self.delta_time,
            );
            let now = self.time + f64::from(self.delta_time);
            match crossing {
                LineCrossing::Forward => {
                    entry.laps += 1;
                    let lap_time = now - entry.lap_started;
                    entry.lap_started = now;
                    // A crossing that brings the count to one only ends the run from the grid.
                    if entry.laps > 1 {
                        let best = entry.best_lap.map_or(lap_time, |best| best.min(lap_time));
                        entry.best_lap = Some(best);
                    }
                    info!(
                        id = entry.id,
                        name = entry.robot.name(),
                        lap = entry.laps,
                        lap_time,
                        "lap completed"
                    );
                    if let Some(every) = limits.pit_every.filter(|every| *every > 0) {
                        if entry.laps % every == 0 {
                            match entry.robot.on_pit_request(&entry.car, &situation) {
                                PitResponse::Immediate => {
                                    debug!(id = entry.id, "pit stop skipped")
                                }
                                PitResponse::Menu => {
                                    info!(id = entry.id, "driver asked for the pit menu")
                                }
                            }
                        }
                    }
                }
                LineCrossing::Backward => {
                    entry.laps = entry.laps.saturating_sub(1);
                    debug!(id = entry.id, "crossed the line backwards");
                }
                LineCrossing::None => {}
            }
        }

        self.tick += 1;
        self.time += f64::from(self.delta_time);
    }

    /// Step until every car has done `limits.laps` or time runs out.
    pub fn run(&mut self, limits: &RaceLimits) -> Vec<RaceSummary> {
        while self.time < limits.max_time {
            // `laps` counts the grid crossing too.
            if !self.cars.is_empty() && self.cars.iter().all(|entry| entry.laps > limits.laps) {
                break;
            }
            self.step(limits);
        }
        self.finish()
    }

    /// End the race for every car. Summaries come back in finishing order.
    pub fn finish(&mut self) -> Vec<RaceSummary> {
        let track = &self.track;
        let mut standings: Vec<(u32, RaceSummary)> = self
            .cars
            .iter_mut()
            .map(|entry| {
                entry.car.state = entry.sim.state;
                entry.robot.on_race_end(&entry.car);
                let summary = RaceSummary {
                    id: entry.id,
                    name: entry.robot.name().to_string(),
                    laps: entry.laps.saturating_sub(1),
                    best_lap: entry.best_lap,
                    distance: entry.sim.odometer,
                    lap_progress: track.distance_from_start(&entry.sim.state.track_pos),
                    reverse_ticks: entry.reverse_ticks,
                };
                (entry.laps, summary)
            })
            .collect();
        // Crossings first: a car still behind the line reads almost a full lap of progress.
        standings.sort_by(|(a_crossings, a), (b_crossings, b)| {
            b_crossings
                .cmp(a_crossings)
                .then(b.lap_progress.total_cmp(&a.lap_progress))
        });
        info!(time = self.time, ticks = self.tick, "race finished");
        standings.into_iter().map(|(_, summary)| summary).collect()
    }
}

use crate::config::DriverConfig;

/// Counts ticks spent slow, roughly aligned and away from the centre line.
#[derive(Clone, Debug, Default)]
pub struct StuckDetector {
    count: u32,
    max_count: u32,
}

impl StuckDetector {
    pub fn new(max_count: u32) -> Self {
        Self {
            count: 0,
            max_count,
        }
    }

    pub fn reset(&mut self, max_count: u32) {
        self.count = 0;
        self.max_count = max_count;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// Advance one tick. Returns true once the car has lingered past the limit
    /// while pointing further away from the centre line.
    pub fn update(
        &mut self,
        angle: f32,
        speed: f32,
        to_middle: f32,
        config: &DriverConfig,
    ) -> bool {
        let lingering = angle.abs() < config.max_unstuck_angle()
            && speed < config.max_unstuck_speed
            && to_middle.abs() > config.min_unstuck_dist;
        if !lingering {
            self.count = 0;
            return false;
        }
        if self.count > self.max_count && to_middle * angle < 0.0 {
            return true;
        }
        self.count = self.count.saturating_add(1);
        false
    }
}

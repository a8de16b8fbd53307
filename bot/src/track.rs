use core::f32::consts::TAU;

use bevy_math::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::geometry::{heading_vector, left_normal, normalize_angle, rotate_about};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Straight,
    Left,
    Right,
}

impl SegmentKind {
    /// +1 for left-hand curves and straights, -1 for right-hand curves.
    pub fn turn_sign(self) -> f32 {
        match self {
            SegmentKind::Right => -1.0,
            SegmentKind::Straight | SegmentKind::Left => 1.0,
        }
    }

    pub fn is_curve(self) -> bool {
        !matches!(self, SegmentKind::Straight)
    }
}

/// One piece of the track centre line.
///
/// `length` is the centre-line length in metres for every kind. For curves,
/// `arc` is the turned angle in radians and `radius` the centre-line radius;
/// both are zero on straights.
#[derive(Clone, Debug)]
pub struct Segment {
    pub kind: SegmentKind,
    pub length: f32,
    pub arc: f32,
    pub radius: f32,
    pub width: f32,
    pub friction: f32,
    pub start_heading: f32,
    pub start_left: Vec2,
    pub start_right: Vec2,
    pub end_left: Vec2,
    pub end_right: Vec2,
    pub center: Vec2,
}

impl Segment {
    /// Midpoint of the segment's start edge.
    pub fn start_mid(&self) -> Vec2 {
        (self.start_left + self.start_right) * 0.5
    }

    pub fn end_mid(&self) -> Vec2 {
        (self.end_left + self.end_right) * 0.5
    }

    /// Tangent direction of the centre line at `to_start`.
    pub fn tangent_angle(&self, to_start: f32) -> f32 {
        match self.kind {
            SegmentKind::Straight => self.start_heading,
            SegmentKind::Left => normalize_angle(self.start_heading + to_start),
            SegmentKind::Right => normalize_angle(self.start_heading - to_start),
        }
    }

    /// Project `position` onto this segment, clamping progress into the segment.
    /// Returns the position and the distance to the clamped centre-line point.
    fn project(&self, index: usize, position: Vec2) -> (TrackPosition, f32) {
        let mid = self.start_mid();
        match self.kind {
            SegmentKind::Straight => {
                let local = position - mid;
                let along = local.dot(heading_vector(self.start_heading));
                let lateral = local.dot(left_normal(self.start_heading));
                let to_start = along.clamp(0.0, self.length);
                let on_line = mid + heading_vector(self.start_heading) * to_start;
                let pos = TrackPosition {
                    segment: index,
                    to_start,
                    to_middle: lateral,
                };
                (pos, position.distance(on_line))
            }
            SegmentKind::Left | SegmentKind::Right => {
                let sign = self.kind.turn_sign();
                let from_center = position - self.center;
                let start_dir = mid - self.center;
                let swept = ((from_center.y.atan2(from_center.x)
                    - start_dir.y.atan2(start_dir.x))
                    * sign)
                    .rem_euclid(TAU);
                // Outside the piece, snap to whichever end is angularly closer.
                let to_start = if swept <= self.arc {
                    swept
                } else if swept - self.arc < TAU - swept {
                    self.arc
                } else {
                    0.0
                };
                let on_line = rotate_about(mid, self.center, to_start * sign);
                let to_middle = (self.radius - from_center.length()) * sign;
                let pos = TrackPosition {
                    segment: index,
                    to_start,
                    to_middle,
                };
                (pos, position.distance(on_line))
            }
        }
    }
}

/// Where a car sits relative to the centre line.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackPosition {
    pub segment: usize,
    /// Progress from the segment start: metres on straights, radians on curves.
    pub to_start: f32,
    /// Signed lateral offset from the centre line, positive to the left.
    pub to_middle: f32,
}

/// A closed loop of segments. The segment after the last one is the first.
#[derive(Clone, Debug)]
pub struct Track {
    name: String,
    segments: Vec<Segment>,
}

impl Track {
    pub fn new(name: impl Into<String>, segments: Vec<Segment>) -> Result<Self, TrackError> {
        if segments.is_empty() {
            return Err(TrackError::Empty);
        }
        for (index, seg) in segments.iter().enumerate() {
            let reason = if !(seg.width > 0.0) {
                Some("width must be positive")
            } else if !(seg.friction > 0.0) {
                Some("friction must be positive")
            } else if !(seg.length > 0.0) {
                Some("length must be positive")
            } else if seg.kind.is_curve() && !(seg.radius > 0.0 && seg.arc > 0.0) {
                Some("curves need a positive radius and arc")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(TrackError::InvalidSegment {
                    index,
                    reason: reason.to_string(),
                });
            }
        }
        Ok(Self {
            name: name.into(),
            segments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment at `index`, wrapping around the loop.
    pub fn segment(&self, index: usize) -> &Segment {
        &self.segments[index % self.segments.len()]
    }

    pub fn next(&self, index: usize) -> usize {
        (index + 1) % self.segments.len()
    }

    pub fn length(&self) -> f32 {
        self.segments.iter().map(|s| s.length).sum()
    }

    /// Distance along the centre line from the start of segment 0.
    pub fn distance_from_start(&self, pos: &TrackPosition) -> f32 {
        let before: f32 = self.segments.iter().take(pos.segment).map(|s| s.length).sum();
        let seg = self.segment(pos.segment);
        let along = if seg.kind.is_curve() {
            pos.to_start * seg.radius
        } else {
            pos.to_start
        };
        before + along
    }

    /// Gap between the end of the last segment and the start of the first.
    pub fn closure_gap(&self) -> f32 {
        let first = &self.segments[0];
        let last = &self.segments[self.segments.len() - 1];
        last.end_mid().distance(first.start_mid())
    }

    /// Locate `position` on the track by nearest centre-line projection.
    /// `hint` wins ties, so a car keeps its segment at segment boundaries.
    pub fn locate(&self, position: Vec2, hint: usize) -> TrackPosition {
        let hint = hint % self.segments.len();
        let (mut best, mut best_dist) = self.segments[hint].project(hint, position);
        for offset in 1..self.segments.len() {
            let index = (hint + offset) % self.segments.len();
            let (candidate, dist) = self.segments[index].project(index, position);
            if dist < best_dist {
                best = candidate;
                best_dist = dist;
            }
        }
        best
    }
}

/// Lays out segments one after another from a start pose.
pub struct TrackBuilder {
    name: String,
    width: f32,
    friction: f32,
    position: Vec2,
    heading: f32,
    segments: Vec<Segment>,
}

impl TrackBuilder {
    pub fn new(name: impl Into<String>, width: f32, friction: f32) -> Self {
        Self {
            name: name.into(),
            width,
            friction,
            position: Vec2::ZERO,
            heading: 0.0,
            segments: Vec::new(),
        }
    }

    pub fn start_at(mut self, position: Vec2, heading: f32) -> Self {
        self.position = position;
        self.heading = heading;
        self
    }

    pub fn straight(self, length: f32) -> Self {
        let (width, friction) = (self.width, self.friction);
        self.straight_with(length, width, friction)
    }

    pub fn straight_with(mut self, length: f32, width: f32, friction: f32) -> Self {
        let half = left_normal(self.heading) * width * 0.5;
        let start = self.position;
        let end = start + heading_vector(self.heading) * length;
        self.segments.push(Segment {
            kind: SegmentKind::Straight,
            length,
            arc: 0.0,
            radius: 0.0,
            width,
            friction,
            start_heading: self.heading,
            start_left: start + half,
            start_right: start - half,
            end_left: end + half,
            end_right: end - half,
            center: Vec2::ZERO,
        });
        self.position = end;
        self
    }

    pub fn left(self, radius: f32, arc: f32) -> Self {
        let (width, friction) = (self.width, self.friction);
        self.curve_with(SegmentKind::Left, radius, arc, width, friction)
    }

    pub fn right(self, radius: f32, arc: f32) -> Self {
        let (width, friction) = (self.width, self.friction);
        self.curve_with(SegmentKind::Right, radius, arc, width, friction)
    }

    pub fn curve_with(
        mut self,
        kind: SegmentKind,
        radius: f32,
        arc: f32,
        width: f32,
        friction: f32,
    ) -> Self {
        if !kind.is_curve() {
            return self.straight_with(radius * arc, width, friction);
        }
        let sign = kind.turn_sign();
        let half = left_normal(self.heading) * width * 0.5;
        let start = self.position;
        let center = start + left_normal(self.heading) * radius * sign;
        let turn = arc * sign;
        let start_left = start + half;
        let start_right = start - half;
        self.segments.push(Segment {
            kind,
            length: arc * radius,
            arc,
            radius,
            width,
            friction,
            start_heading: self.heading,
            start_left,
            start_right,
            end_left: rotate_about(start_left, center, turn),
            end_right: rotate_about(start_right, center, turn),
            center,
        });
        self.position = rotate_about(start, center, turn);
        self.heading = normalize_angle(self.heading + turn);
        self
    }

    pub fn build(self) -> Result<Track, TrackError> {
        Track::new(self.name, self.segments)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use core::f32::consts::PI;

    use super::*;

    /// 100 m straights joined by two 180° left turns split into 45° pieces.
    pub(crate) fn oval() -> Track {
        TrackBuilder::new("oval", 12.0, 1.0)
            .straight(100.0)
            .left(40.0, PI / 4.0)
            .left(40.0, PI / 4.0)
            .left(40.0, PI / 4.0)
            .left(40.0, PI / 4.0)
            .straight(100.0)
            .left(40.0, PI / 4.0)
            .left(40.0, PI / 4.0)
            .left(40.0, PI / 4.0)
            .left(40.0, PI / 4.0)
            .build()
            .unwrap()
    }

    #[test]
    fn oval_closes() {
        let track = oval();
        assert_eq!(track.len(), 10);
        assert!(track.closure_gap() < 1e-2);
    }

    #[test]
    fn next_wraps_around() {
        let track = oval();
        assert_eq!(track.next(3), 4);
        assert_eq!(track.next(9), 0);
    }

    #[test]
    fn empty_track_is_rejected() {
        assert!(matches!(Track::new("none", Vec::new()), Err(TrackError::Empty)));
    }

    #[test]
    fn zero_friction_is_rejected() {
        let err = TrackBuilder::new("ice", 10.0, 0.0).straight(10.0).build();
        assert!(matches!(err, Err(TrackError::InvalidSegment { index: 0, .. })));
    }

    #[test]
    fn locate_on_straight() {
        let track = oval();
        let pos = track.locate(Vec2::new(30.0, 2.5), 0);
        assert_eq!(pos.segment, 0);
        assert!((pos.to_start - 30.0).abs() < 1e-4);
        assert!((pos.to_middle - 2.5).abs() < 1e-4);
    }

    #[test]
    fn locate_in_left_curve_inside_is_positive() {
        let track = oval();
        let seg = track.segment(1);
        let point = rotate_about(seg.start_mid(), seg.center, 0.3);
        let inside = point + (seg.center - point).normalize() * 2.0;
        let pos = track.locate(inside, 0);
        assert_eq!(pos.segment, 1);
        assert!((pos.to_start - 0.3).abs() < 1e-3);
        assert!((pos.to_middle - 2.0).abs() < 1e-3);
    }

    #[test]
    fn locate_in_right_curve_uses_left_positive_offset() {
        let track = TrackBuilder::new("s", 10.0, 1.0)
            .straight(20.0)
            .right(30.0, PI / 2.0)
            .build()
            .unwrap();
        let seg = track.segment(1);
        let point = rotate_about(seg.start_mid(), seg.center, -0.5);
        // Towards the centre of a right-hand curve is to the right.
        let inside = point + (seg.center - point).normalize() * 1.5;
        let pos = track.locate(inside, 1);
        assert_eq!(pos.segment, 1);
        assert!((pos.to_middle + 1.5).abs() < 1e-3);
    }

    #[test]
    fn locate_deep_into_long_curve() {
        let track = TrackBuilder::new("hairpin", 12.0, 1.0)
            .straight(100.0)
            .left(40.0, 1.5 * PI)
            .build()
            .unwrap();
        let seg = track.segment(1);
        let point = rotate_about(seg.start_mid(), seg.center, 4.0);
        let pos = track.locate(point, 1);
        assert_eq!(pos.segment, 1);
        assert!((pos.to_start - 4.0).abs() < 1e-3);
        assert!(pos.to_middle.abs() < 1e-3);
    }

    #[test]
    fn locate_just_before_curve_snaps_to_its_start() {
        let track = TrackBuilder::new("hairpin", 12.0, 1.0)
            .straight(100.0)
            .left(40.0, 1.5 * PI)
            .build()
            .unwrap();
        let seg = track.segment(1);
        let point = rotate_about(seg.start_mid(), seg.center, -0.1);
        let (pos, _) = seg.project(1, point);
        assert_eq!(pos.to_start, 0.0);
    }

    #[test]
    fn tangent_follows_curve_direction() {
        let track = oval();
        assert!((track.segment(1).tangent_angle(0.5) - 0.5).abs() < 1e-6);
        let right = TrackBuilder::new("r", 10.0, 1.0).right(20.0, 1.0).build().unwrap();
        assert!((right.segment(0).tangent_angle(0.5) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn distance_from_start_accumulates_lengths() {
        let track = oval();
        let pos = TrackPosition {
            segment: 2,
            to_start: 0.1,
            to_middle: 0.0,
        };
        let expected = 100.0 + 40.0 * PI / 4.0 + 0.1 * 40.0;
        assert!((track.distance_from_start(&pos) - expected).abs() < 1e-3);
    }
}

//! Turns raw pointer samples into refresh signals.
//!
//! [`GestureDetector`] is a pure reducer: the caller passes every sample
//! together with "is the feed at its origin" and the current time, and gets
//! back at most one [`FeedEvent`].

use crate::engine::FeedEvent;
use std::time::{Duration, Instant};

pub const DEFAULT_PULL_THRESHOLD: i32 = 80;
pub const DEFAULT_WHEEL_COOLDOWN: Duration = Duration::from_millis(1000);

/// One raw input sample. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSample {
    Down { y: i32 },
    Move { y: i32 },
    Up,
    Cancel,
    /// negative `delta_y` scrolls toward newer records
    Wheel { delta_y: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Drag {
    start_y: i32,
    current_y: i32,
}

impl Drag {
    fn distance(&self) -> i32 {
        self.current_y - self.start_y
    }
}

#[derive(Debug, Clone)]
pub struct GestureDetector {
    pull_threshold: i32,
    wheel_cooldown: Duration,
    drag: Option<Drag>,
    last_wheel_signal: Option<Instant>,
}

impl Default for GestureDetector {
    fn default() -> Self {
        Self::new(DEFAULT_PULL_THRESHOLD, DEFAULT_WHEEL_COOLDOWN)
    }
}

impl GestureDetector {
    pub fn new(pull_threshold: i32, wheel_cooldown: Duration) -> Self {
        Self {
            pull_threshold,
            wheel_cooldown,
            drag: None,
            last_wheel_signal: None,
        }
    }

    /// How far the active drag is currently pulled down, for the indicator.
    pub fn pull_distance(&self) -> Option<i32> {
        self.drag.map(|d| d.distance().max(0))
    }

    pub fn is_armed(&self) -> bool {
        self.pull_distance()
            .is_some_and(|distance| distance > self.pull_threshold)
    }

    pub fn feed(
        &mut self,
        sample: PointerSample,
        at_origin: bool,
        now: Instant,
    ) -> Option<FeedEvent> {
        match sample {
            PointerSample::Down { y } => {
                // a drag only starts at the origin
                self.drag = at_origin.then_some(Drag {
                    start_y: y,
                    current_y: y,
                });
                None
            }
            PointerSample::Move { y } => {
                if let Some(drag) = self.drag.as_mut() {
                    drag.current_y = y;
                }
                None
            }
            PointerSample::Up => {
                let distance = self.drag.take()?.distance();
                (distance > self.pull_threshold).then_some(FeedEvent::PullReleased { distance })
            }
            PointerSample::Cancel => {
                self.drag = None;
                None
            }
            PointerSample::Wheel { delta_y } => {
                if delta_y >= 0 || !at_origin {
                    return None;
                }
                let cooled = self
                    .last_wheel_signal
                    .is_none_or(|last| now.saturating_duration_since(last) >= self.wheel_cooldown);
                if !cooled {
                    log::debug!("Wheel refresh throttled");
                    return None;
                }
                self.last_wheel_signal = Some(now);
                Some(FeedEvent::WheelUp)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pull(detector: &mut GestureDetector, from: i32, to: i32, now: Instant) -> Option<FeedEvent> {
        detector.feed(PointerSample::Down { y: from }, true, now);
        detector.feed(PointerSample::Move { y: to }, true, now);
        detector.feed(PointerSample::Up, true, now)
    }

    #[test]
    fn test_pull_past_threshold_fires() {
        let mut detector = GestureDetector::default();
        let event = pull(&mut detector, 10, 100, Instant::now());
        assert_eq!(event, Some(FeedEvent::PullReleased { distance: 90 }));
        assert_eq!(detector.pull_distance(), None);
    }

    #[test]
    fn test_pull_at_threshold_does_not_fire() {
        let mut detector = GestureDetector::default();
        assert_eq!(pull(&mut detector, 0, 80, Instant::now()), None);
    }

    #[test]
    fn test_upward_drag_does_not_fire() {
        let mut detector = GestureDetector::default();
        assert_eq!(pull(&mut detector, 200, 0, Instant::now()), None);
    }

    #[test]
    fn test_drag_away_from_origin_is_ignored() {
        let mut detector = GestureDetector::default();
        let now = Instant::now();
        detector.feed(PointerSample::Down { y: 0 }, false, now);
        detector.feed(PointerSample::Move { y: 200 }, true, now);
        assert_eq!(detector.feed(PointerSample::Up, true, now), None);
    }

    #[test]
    fn test_cancel_drops_drag() {
        let mut detector = GestureDetector::default();
        let now = Instant::now();
        detector.feed(PointerSample::Down { y: 0 }, true, now);
        detector.feed(PointerSample::Move { y: 200 }, true, now);
        assert!(detector.is_armed());
        detector.feed(PointerSample::Cancel, true, now);
        assert_eq!(detector.feed(PointerSample::Up, true, now), None);
    }

    #[test]
    fn test_wheel_up_at_origin_is_throttled() {
        let mut detector = GestureDetector::default();
        let start = Instant::now();
        let wheel = PointerSample::Wheel { delta_y: -1 };

        assert_eq!(detector.feed(wheel, true, start), Some(FeedEvent::WheelUp));
        assert_eq!(
            detector.feed(wheel, true, start + Duration::from_millis(500)),
            None
        );
        assert_eq!(
            detector.feed(wheel, true, start + Duration::from_millis(1000)),
            Some(FeedEvent::WheelUp)
        );
    }

    #[test]
    fn test_wheel_down_or_away_from_origin_is_ignored() {
        let mut detector = GestureDetector::default();
        let now = Instant::now();
        assert_eq!(detector.feed(PointerSample::Wheel { delta_y: 1 }, true, now), None);
        assert_eq!(detector.feed(PointerSample::Wheel { delta_y: -1 }, false, now), None);
    }

    #[test]
    fn test_pull_fires_inside_wheel_cooldown() {
        let mut detector = GestureDetector::default();
        let start = Instant::now();
        assert_eq!(
            detector.feed(PointerSample::Wheel { delta_y: -3 }, true, start),
            Some(FeedEvent::WheelUp)
        );

        let soon = start + Duration::from_millis(100);
        assert_eq!(
            pull(&mut detector, 0, 120, soon),
            Some(FeedEvent::PullReleased { distance: 120 })
        );
    }
}

//! Touch Input Resolver — turns a touch snapshot into the pitch to play.
//!
//! Touches are classified by the control they started on, but the control
//! used for the pitch lookup is the one *currently* under the finger, so a
//! touch sliding across strings or semitone keys changes the note.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::controls::{equal_tempered, ControlKind, ControlLayout};
use crate::touch::TouchPoint;

/// Locates the control under a screen point.
pub trait HitTest {
    /// Id of the control at (`x`, `y`), if any.
    fn locate(&self, x: f64, y: f64) -> Option<String>;
}

impl<F> HitTest for F
where
    F: Fn(f64, f64) -> Option<String>,
{
    fn locate(&self, x: f64, y: f64) -> Option<String> {
        self(x, y)
    }
}

/// An axis-aligned control rectangle in client coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(id: &str, left: f64, top: f64, width: f64, height: f64) -> Self {
        Region {
            id: id.to_string(),
            left,
            top,
            width,
            height,
        }
    }

    /// Half-open containment: the right and bottom edges belong to the
    /// neighbouring region.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.left + self.width && y >= self.top && y < self.top + self.height
    }
}

/// Hit testing against a list of rectangles, for hosts without a DOM.
/// Later regions are drawn on top of earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionMap {
    regions: Vec<Region>,
}

impl RegionMap {
    pub fn new(regions: Vec<Region>) -> Self {
        RegionMap { regions }
    }

    pub fn push(&mut self, region: Region) {
        self.regions.push(region);
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl HitTest for RegionMap {
    fn locate(&self, x: f64, y: f64) -> Option<String> {
        self.regions
            .iter()
            .rev()
            .find(|r| r.contains(x, y))
            .map(|r| r.id.clone())
    }
}

/// Maps touch snapshots to frequencies using a control layout.
#[derive(Debug, Clone, Default)]
pub struct TouchResolver {
    layout: ControlLayout,
}

impl TouchResolver {
    pub fn new(layout: ControlLayout) -> Self {
        TouchResolver { layout }
    }

    pub fn layout(&self) -> &ControlLayout {
        &self.layout
    }

    /// Frequency to sound for this snapshot, or `None` for silence.
    ///
    /// With several strings held, the touch with the lowest identifier
    /// wins. With several semitone keys held, the one lowest on screen
    /// (greatest `client_y`) wins, ties going to the lowest identifier.
    pub fn resolve_frequency<H>(&self, touches: &[TouchPoint], hit: &H) -> Option<f64>
    where
        H: HitTest + ?Sized,
    {
        let string_touch = touches
            .iter()
            .filter(|t| ControlKind::of(&t.target) == Some(ControlKind::String))
            .min_by_key(|t| t.identifier)?;

        let base = hit
            .locate(string_touch.client_x, string_touch.client_y)
            .and_then(|id| self.layout.string_frequency(&id))?;

        let offset = touches
            .iter()
            .filter(|t| ControlKind::of(&t.target) == Some(ControlKind::Semitone))
            .max_by(|a, b| highest_semitone(a, b))
            .and_then(|t| hit.locate(t.client_x, t.client_y))
            .and_then(|id| self.layout.semitone_offset(&id))
            .unwrap_or(0);

        Some(equal_tempered(base, offset))
    }
}

/// Ordering for `max_by`: greater Y is "higher", then lower identifier.
fn highest_semitone(a: &TouchPoint, b: &TouchPoint) -> Ordering {
    a.client_y
        .total_cmp(&b.client_y)
        .then_with(|| b.identifier.cmp(&a.identifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Strings are 100px-wide columns on the left half, semitone keys are
    /// 50px-tall rows on the right half (semitone-1 at the top).
    fn geometry() -> RegionMap {
        let mut map = RegionMap::default();
        for (i, id) in ["string-A", "string-D", "string-G", "string-C"].iter().enumerate() {
            map.push(Region::new(id, i as f64 * 100.0, 0.0, 100.0, 400.0));
        }
        for n in 1..=6 {
            let top = (n - 1) as f64 * 50.0;
            map.push(Region::new(&format!("semitone-{n}"), 400.0, top, 200.0, 50.0));
        }
        map
    }

    fn on_string(id: i64, column: usize) -> TouchPoint {
        let ids = ["string-A", "string-D", "string-G", "string-C"];
        TouchPoint::new(id, column as f64 * 100.0 + 50.0, 200.0, ids[column])
    }

    fn on_semitone(id: i64, n: u8) -> TouchPoint {
        let y = (n - 1) as f64 * 50.0 + 25.0;
        TouchPoint::new(id, 500.0, y, &format!("semitone-{n}"))
    }

    #[test]
    fn no_touches_is_silence() {
        let resolver = TouchResolver::default();
        assert_eq!(resolver.resolve_frequency(&[], &geometry()), None);
    }

    #[test]
    fn semitones_alone_are_silence() {
        let resolver = TouchResolver::default();
        let touches = [on_semitone(0, 2), on_semitone(1, 5)];
        assert_eq!(resolver.resolve_frequency(&touches, &geometry()), None);
    }

    #[test]
    fn open_string_is_base_frequency() {
        let resolver = TouchResolver::default();
        let expected = [65.4, 98.0, 146.0, 220.0];
        for (column, hz) in expected.iter().enumerate() {
            let touches = [on_string(0, column)];
            assert_eq!(resolver.resolve_frequency(&touches, &geometry()), Some(*hz));
        }
    }

    #[test]
    fn semitone_raises_pitch() {
        let resolver = TouchResolver::default();
        let touches = [on_string(0, 0), on_semitone(1, 1)];
        let hz = resolver.resolve_frequency(&touches, &geometry()).unwrap();
        assert!((hz - 65.4 * 2f64.powf(1.0 / 12.0)).abs() < 1e-9);
        assert!((hz - 69.29).abs() < 0.01, "A + 1 semitone should be ~69.29 Hz, got {hz}");
    }

    #[test]
    fn lowest_semitone_on_screen_wins_regardless_of_order() {
        let resolver = TouchResolver::default();
        let a = [on_string(0, 1), on_semitone(1, 2), on_semitone(2, 5)];
        let b = [on_semitone(2, 5), on_semitone(1, 2), on_string(0, 1)];
        let expected = equal_tempered(98.0, 5);
        assert_eq!(resolver.resolve_frequency(&a, &geometry()), Some(expected));
        assert_eq!(resolver.resolve_frequency(&b, &geometry()), Some(expected));
    }

    #[test]
    fn equal_semitone_height_prefers_lowest_identifier() {
        let resolver = TouchResolver::default();
        // Same Y, two different keys through a custom hit test keyed on X.
        let hit = |x: f64, _y: f64| -> Option<String> {
            if x < 100.0 {
                Some("string-D".to_string())
            } else if x < 200.0 {
                Some("semitone-4".to_string())
            } else {
                Some("semitone-6".to_string())
            }
        };
        let touches = [
            TouchPoint::new(0, 50.0, 10.0, "string-D"),
            TouchPoint::new(9, 250.0, 80.0, "semitone-6"),
            TouchPoint::new(4, 150.0, 80.0, "semitone-4"),
        ];
        assert_eq!(
            resolver.resolve_frequency(&touches, &hit),
            Some(equal_tempered(98.0, 4))
        );
    }

    #[test]
    fn multiple_strings_lowest_identifier_wins() {
        let resolver = TouchResolver::default();
        let touches = [on_string(7, 3), on_string(2, 1), on_string(5, 0)];
        assert_eq!(resolver.resolve_frequency(&touches, &geometry()), Some(98.0));
    }

    #[test]
    fn string_touch_relocated_by_position() {
        let resolver = TouchResolver::default();
        // Started on string-A, slid over string-G.
        let touches = [TouchPoint::new(0, 250.0, 200.0, "string-A")];
        assert_eq!(resolver.resolve_frequency(&touches, &geometry()), Some(146.0));
    }

    #[test]
    fn string_touch_slid_off_controls_is_silence() {
        let resolver = TouchResolver::default();
        let off_screen = [TouchPoint::new(0, 50.0, 900.0, "string-A")];
        assert_eq!(resolver.resolve_frequency(&off_screen, &geometry()), None);

        let onto_semitone = [TouchPoint::new(0, 500.0, 25.0, "string-A")];
        assert_eq!(resolver.resolve_frequency(&onto_semitone, &geometry()), None);
    }

    #[test]
    fn semitone_slid_off_keys_is_offset_zero() {
        let resolver = TouchResolver::default();
        let touches = [on_string(0, 2), TouchPoint::new(1, 500.0, 1000.0, "semitone-3")];
        assert_eq!(resolver.resolve_frequency(&touches, &geometry()), Some(146.0));
    }

    #[test]
    fn non_control_targets_are_ignored() {
        let resolver = TouchResolver::default();
        let touches = [TouchPoint::new(0, 50.0, 200.0, "start"), on_string(1, 1)];
        assert_eq!(resolver.resolve_frequency(&touches, &geometry()), Some(98.0));
    }

    #[test]
    fn string_then_semitone_then_release() {
        let resolver = TouchResolver::default();
        let mut touches = vec![on_string(0, 1)];
        assert_eq!(resolver.resolve_frequency(&touches, &geometry()), Some(98.0));

        touches.push(on_semitone(1, 3));
        let hz = resolver.resolve_frequency(&touches, &geometry()).unwrap();
        assert!((hz - 116.54).abs() < 0.01, "D + 3 semitones should be ~116.54 Hz, got {hz}");

        touches.clear();
        assert_eq!(resolver.resolve_frequency(&touches, &geometry()), None);
    }

    #[test]
    fn region_map_topmost_wins() {
        let mut map = RegionMap::new(vec![Region::new("string-A", 0.0, 0.0, 100.0, 100.0)]);
        map.push(Region::new("semitone-1", 50.0, 50.0, 100.0, 100.0));
        assert_eq!(map.locate(10.0, 10.0).as_deref(), Some("string-A"));
        assert_eq!(map.locate(75.0, 75.0).as_deref(), Some("semitone-1"));
        assert_eq!(map.locate(100.0, 10.0), None);
        assert_eq!(map.len(), 2);
    }
}

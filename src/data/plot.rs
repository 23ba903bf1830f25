//! Plot data mirrored from session notifications.
//!
//! The chart never reads the session log directly: it rebuilds its own copy
//! from `Sample`/`Marker`/`Reset` notifications.

use crate::session::{EventMarker, Sample};

/// Fraction of the value range added above and below the data.
const Y_MARGIN: f64 = 0.05;

/// Points and timeline annotations for the live chart.
#[derive(Debug, Clone, Default)]
pub struct PlotData {
    /// `(x = elapsed_time, y = value)` in arrival order.
    pub points: Vec<(f64, f64)>,
    pub markers: Vec<EventMarker>,
}

impl PlotData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_sample(&mut self, sample: Sample) {
        self.points.push((sample.elapsed_time, sample.value));
    }

    pub fn push_marker(&mut self, marker: EventMarker) {
        self.markers.push(marker);
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.markers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.markers.is_empty()
    }

    /// X axis bounds covering every point and marker.
    pub fn x_bounds(&self) -> [f64; 2] {
        let last_point = self.points.last().map_or(0.0, |p| p.0);
        let last_marker = self.markers.last().map_or(0.0, |m| m.elapsed_time);
        let max = last_point.max(last_marker);
        [0.0, if max > 0.0 { max } else { 1.0 }]
    }

    /// Y axis bounds with a small margin. Flat data gets a unit band.
    pub fn y_bounds(&self) -> [f64; 2] {
        let mut values = self.points.iter().map(|p| p.1);
        let Some(first) = values.next() else {
            return [0.0, 1.0];
        };
        let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let range = max - min;
        if range <= f64::EPSILON {
            return [min - 0.5, max + 0.5];
        }
        [min - range * Y_MARGIN, max + range * Y_MARGIN]
    }

    /// Vertical line for a marker spanning the given y bounds.
    pub fn marker_line(marker: &EventMarker, y_bounds: [f64; 2]) -> [(f64, f64); 2] {
        [
            (marker.elapsed_time, y_bounds[0]),
            (marker.elapsed_time, y_bounds[1]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, v: f64) -> Sample {
        Sample {
            elapsed_time: t,
            value: v,
        }
    }

    #[test]
    fn test_empty_bounds() {
        let plot = PlotData::new();
        assert_eq!(plot.x_bounds(), [0.0, 1.0]);
        assert_eq!(plot.y_bounds(), [0.0, 1.0]);
    }

    #[test]
    fn test_bounds_cover_data() {
        let mut plot = PlotData::new();
        plot.push_sample(sample(0.0, 10.0));
        plot.push_sample(sample(2.0, 20.0));
        plot.push_marker(EventMarker {
            sequence_id: 1,
            elapsed_time: 3.0,
        });
        assert_eq!(plot.x_bounds(), [0.0, 3.0]);
        let [lo, hi] = plot.y_bounds();
        assert!(lo < 10.0 && hi > 20.0);
    }

    #[test]
    fn test_flat_series_gets_band() {
        let mut plot = PlotData::new();
        plot.push_sample(sample(0.0, 5.0));
        plot.push_sample(sample(1.0, 5.0));
        assert_eq!(plot.y_bounds(), [4.5, 5.5]);
    }

    #[test]
    fn test_clear() {
        let mut plot = PlotData::new();
        plot.push_sample(sample(0.0, 5.0));
        plot.clear();
        assert!(plot.is_empty());
    }
}

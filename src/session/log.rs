//! Append-only storage of samples and event markers.

use serde::{Deserialize, Serialize};

/// One timestamped value accepted from the stream while running.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Active elapsed seconds since session start.
    pub elapsed_time: f64,
    pub value: f64,
}

/// A sequentially numbered annotation on the session timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventMarker {
    /// Starts at 1 and increases by exactly 1 per marker.
    pub sequence_id: u32,
    pub elapsed_time: f64,
}

impl EventMarker {
    /// Label used for timeline annotations (`#3`).
    pub fn label(&self) -> String {
        format!("#{}", self.sequence_id)
    }
}

/// Ordered samples and markers for the current session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataLog {
    samples: Vec<Sample>,
    events: Vec<EventMarker>,
}

impl DataLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. Gating is the caller's job.
    pub fn append_sample(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Append a marker at `elapsed_time` with the next sequence id.
    pub fn append_event(&mut self, elapsed_time: f64) -> EventMarker {
        let marker = EventMarker {
            sequence_id: self.next_sequence_id(),
            elapsed_time,
        };
        self.events.push(marker);
        marker
    }

    /// The id the next marker will receive.
    pub fn next_sequence_id(&self) -> u32 {
        self.events.last().map_or(1, |e| e.sequence_id + 1)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn events(&self) -> &[EventMarker] {
        &self.events
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// No samples and no markers.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.events.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Owned copy for exporters and renderers.
    pub fn snapshot(&self) -> DataLog {
        self.clone()
    }

    /// Empty both sequences; the next marker is id 1 again.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_ids_start_at_one() {
        let mut log = DataLog::new();
        assert_eq!(log.next_sequence_id(), 1);
        let ids: Vec<u32> = (0..3).map(|i| log.append_event(i as f64).sequence_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(log.event_count(), 3);
    }

    #[test]
    fn test_clear_restarts_sequence() {
        let mut log = DataLog::new();
        log.append_sample(Sample {
            elapsed_time: 0.5,
            value: 1.0,
        });
        log.append_event(0.5);
        log.append_event(0.7);
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.append_event(1.0).sequence_id, 1);
    }

    #[test]
    fn test_samples_keep_insertion_order() {
        let mut log = DataLog::new();
        for (t, v) in [(0.0, 3.0), (0.1, 2.0), (0.2, 1.0)] {
            log.append_sample(Sample {
                elapsed_time: t,
                value: v,
            });
        }
        let values: Vec<f64> = log.samples().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![3.0, 2.0, 1.0]);
        assert_eq!(log.sample_count(), 3);
    }

    #[test]
    fn test_markers_alone_are_not_empty() {
        let mut log = DataLog::new();
        log.append_event(2.0);
        assert_eq!(log.sample_count(), 0);
        assert_eq!(log.event_count(), 1);
        assert!(!log.is_empty());
    }

    #[test]
    fn test_marker_label() {
        let marker = EventMarker {
            sequence_id: 7,
            elapsed_time: 1.0,
        };
        assert_eq!(marker.label(), "#7");
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut log = DataLog::new();
        log.append_event(1.0);
        let snap = log.snapshot();
        log.append_event(2.0);
        assert_eq!(snap.event_count(), 1);
        assert_eq!(log.event_count(), 2);
    }
}

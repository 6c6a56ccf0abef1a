use crate::{
    record::Record,
    source::{FetchError, FetchRequest},
    view_state::Granularity,
};

/// The one in-progress record for a granularity, shown above the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSlot {
    granularity: Granularity,
    record: Option<Record>,
}

impl LiveSlot {
    fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            record: None,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }
}

/// Mirrors the backend's in-progress record into a [`LiveSlot`].
///
/// Independent of the page session: it never touches the busy flag and is
/// only recreated when the granularity changes.
#[derive(Debug)]
pub struct LiveRecordMirror {
    slot: LiveSlot,
    generation: u64,
}

impl LiveRecordMirror {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            slot: LiveSlot::new(granularity),
            generation: 1,
        }
    }

    pub fn slot(&self) -> &LiveSlot {
        &self.slot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> FetchRequest {
        FetchRequest::InProgress {
            generation: self.generation,
            granularity: self.slot.granularity,
        }
    }

    /// Points the mirror at `granularity`; false when it already was.
    pub fn retarget(&mut self, granularity: Granularity) -> bool {
        if self.slot.granularity == granularity {
            return false;
        }
        self.slot = LiveSlot::new(granularity);
        self.generation += 1;
        true
    }

    /// Replaces the slot contents wholesale; true when the slot changed.
    pub fn apply(&mut self, generation: u64, result: Result<Option<Record>, FetchError>) -> bool {
        if generation != self.generation {
            log::debug!(
                "Discarding in-progress answer for generation {} (current {})",
                generation,
                self.generation
            );
            return false;
        }

        match result {
            Ok(record) => {
                let changed = self.slot.record != record;
                self.slot.record = record;
                changed
            }
            Err(e) => {
                log::warn!("Fetching the in-progress record failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordKind, RecordStatus};
    use chrono::{TimeZone, Utc};

    fn live_record(content: &str) -> Record {
        Record::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            RecordKind::Trade,
            content,
        )
        .with_status(RecordStatus::InProgress)
    }

    #[test]
    fn test_apply_replaces_and_clears() {
        let mut mirror = LiveRecordMirror::new(Granularity::FifteenMinutes);
        assert!(mirror.apply(1, Ok(Some(live_record("3 buys so far")))));
        assert_eq!(
            mirror.slot().record().map(|r| r.content.as_str()),
            Some("3 buys so far")
        );

        assert!(mirror.apply(1, Ok(None)));
        assert!(mirror.slot().record().is_none());
    }

    #[test]
    fn test_error_keeps_previous_record() {
        let mut mirror = LiveRecordMirror::new(Granularity::FifteenMinutes);
        mirror.apply(1, Ok(Some(live_record("x"))));
        assert!(!mirror.apply(1, Err(FetchError::Status { code: 502 })));
        assert!(mirror.slot().record().is_some());
    }

    #[test]
    fn test_retarget_clears_slot_and_bumps_generation() {
        let mut mirror = LiveRecordMirror::new(Granularity::FifteenMinutes);
        mirror.apply(1, Ok(Some(live_record("x"))));

        assert!(!mirror.retarget(Granularity::FifteenMinutes));
        assert!(mirror.retarget(Granularity::OneDay));
        assert_eq!(mirror.generation(), 2);
        assert_eq!(mirror.slot().granularity(), Granularity::OneDay);
        assert!(mirror.slot().record().is_none());
        assert_eq!(
            mirror.request(),
            FetchRequest::InProgress {
                generation: 2,
                granularity: Granularity::OneDay
            }
        );
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut mirror = LiveRecordMirror::new(Granularity::FifteenMinutes);
        mirror.retarget(Granularity::OneHour);
        assert!(!mirror.apply(1, Ok(Some(live_record("old bucket")))));
        assert!(mirror.slot().record().is_none());
    }
}

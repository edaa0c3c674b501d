/// Last known completion percentage of an upload.
///
/// Every poll response is tagged with the sequence number of its request.
/// Responses older than the last applied one are dropped so the percentage
/// shown to the user never jumps back to a stale value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    percent: u8,
    last_applied: Option<u64>,
}

impl ProgressState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= 100
    }

    /// Applies the value reported by request `seq`. Returns `false` when the
    /// response is stale and was ignored.
    pub fn apply(&mut self, seq: u64, reported: i64) -> bool {
        if matches!(self.last_applied, Some(last) if seq <= last) {
            return false;
        }
        self.last_applied = Some(seq);
        self.percent = reported.clamp(0, 100) as u8;
        true
    }
}

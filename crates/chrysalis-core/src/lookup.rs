// crates/chrysalis-core/src/lookup.rs
//
// Fixed, ordered label tables indexed by stage number.
//
// Stages are 1-based when looked up here. Any stage past the end of a table
// resolves to its last entry, so long chains keep getting the final label.

/// A fixed ordered table of labels, one per evolution stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTable<const N: usize> {
    entries: [&'static str; N],
}

impl<const N: usize> StageTable<N> {
    /// Wrap a non-empty array of labels.
    pub const fn new(entries: [&'static str; N]) -> Self {
        assert!(N > 0, "stage tables must not be empty");
        Self { entries }
    }

    /// Table slot for a 1-based stage: `min(stage - 1, N - 1)`.
    ///
    /// Stage 0 maps to the first slot.
    pub fn clamped_index(&self, stage: u32) -> usize {
        let wanted = usize::try_from(stage.saturating_sub(1)).unwrap_or(usize::MAX);
        wanted.min(N - 1)
    }

    /// Label for a 1-based stage, clamped to the last entry.
    pub fn get(&self, stage: u32) -> &'static str {
        self.entries[self.clamped_index(stage)]
    }

    /// Number of distinct labels in the table.
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// The label every stage past the table end resolves to.
    pub fn last(&self) -> &'static str {
        self.entries[N - 1]
    }
}

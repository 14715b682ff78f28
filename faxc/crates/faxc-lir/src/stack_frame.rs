//! Tuple layout bookkeeping.
//!
//! `faxc-gen` needs, for every tuple-typed local (closure environments
//! included), the word offset of each field so it can size the runtime
//! `malloc` call and emit the right `GEP` sequence. Physical stack slots and
//! register spills are `inkwell`'s concern; this module stops at word-sized
//! field offsets.

/// Field layout of one tuple-typed value. Fields are one word (8 bytes)
/// each; this IR has no sub-word aggregates.
#[derive(Debug, Clone)]
pub struct TupleLayout {
    pub field_offsets: Vec<u32>,
}

impl TupleLayout {
    pub fn for_field_count(count: usize) -> Self {
        Self {
            field_offsets: (0..count as u32).collect(),
        }
    }

    pub fn offset_of(&self, field: u32) -> Option<u32> {
        self.field_offsets.get(field as usize).copied()
    }

    pub fn word_count(&self) -> u32 {
        self.field_offsets.len() as u32
    }

    pub fn byte_size(&self) -> u32 {
        self.word_count() * 8
    }
}

/// Per-function frame shape: how many locals exist, and which of them are
/// tuple-typed and therefore need a [`TupleLayout`] for allocation.
#[derive(Debug, Clone)]
pub struct FrameLayout {
    pub local_count: usize,
    pub aggregate_locals: Vec<(u32, TupleLayout)>,
}

impl FrameLayout {
    pub fn layout_for(&self, local: u32) -> Option<&TupleLayout> {
        self.aggregate_locals
            .iter()
            .find(|(id, _)| *id == local)
            .map(|(_, layout)| layout)
    }
}

#[cfg(test)]
mod stack_frame_tests {
    use super::*;

    #[test]
    fn test_tuple_layout_offsets() {
        let layout = TupleLayout::for_field_count(3);
        assert_eq!(layout.offset_of(0), Some(0));
        assert_eq!(layout.offset_of(2), Some(2));
        assert_eq!(layout.offset_of(3), None);
        assert_eq!(layout.byte_size(), 24);
    }

    #[test]
    fn test_empty_tuple_layout() {
        let layout = TupleLayout::for_field_count(0);
        assert_eq!(layout.word_count(), 0);
        assert_eq!(layout.byte_size(), 0);
    }

    #[test]
    fn test_frame_layout_lookup() {
        let frame = FrameLayout {
            local_count: 2,
            aggregate_locals: vec![(1, TupleLayout::for_field_count(2))],
        };
        assert!(frame.layout_for(1).is_some());
        assert!(frame.layout_for(0).is_none());
    }
}

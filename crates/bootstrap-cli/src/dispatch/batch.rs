//! Batch sequencing and per-batch deduplication

use bootstrap_common::types::Record;
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// Iterator adapter grouping items into `Vec`s of at most `size`
///
/// Every batch but the last holds exactly `size` items.
#[derive(Debug)]
pub struct Batches<I> {
    inner: I,
    size: NonZeroUsize,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<_> = self.inner.by_ref().take(self.size.get()).collect();
        (!batch.is_empty()).then_some(batch)
    }
}

/// Group `iter` into batches of `size`
pub fn batches<I: IntoIterator>(iter: I, size: NonZeroUsize) -> Batches<I::IntoIter> {
    Batches {
        inner: iter.into_iter(),
        size,
    }
}

/// Collapse records sharing an id to the last one seen
///
/// Each surviving record keeps the position where its id first appeared.
/// Records without an id are never merged.
pub fn dedup_by_id(records: Vec<Record>) -> Vec<Record> {
    let mut slots: Vec<Record> = Vec::with_capacity(records.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(records.len());

    for record in records {
        let existing = record.id.as_ref().and_then(|id| positions.get(id).copied());
        match existing {
            Some(pos) => slots[pos] = record,
            None => {
                if let Some(id) = &record.id {
                    positions.insert(id.clone(), slots.len());
                }
                slots.push(record);
            },
        }
    }

    slots
}

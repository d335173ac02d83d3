use crate::bucket::Bucket;
use crate::store::{Entry, Node};
use crate::util::Slice;

/// Engine cursor over one bucket, re-querying the tree per movement.
///
/// The cursor keeps only the current key and asks the bucket's node for the
/// neighboring entry on every step, so it observes writes made through the
/// same transaction and stays usable after the entry under it is deleted.
/// Entries are `(key, Some(value))` for stored pairs and `(key, None)` for
/// nested buckets.
pub(crate) struct Cursor<'tx> {
    bucket: Bucket<'tx>,
    position: Option<Vec<u8>>,
}

impl<'tx> Cursor<'tx> {
    pub(crate) fn new(bucket: Bucket<'tx>) -> Self {
        Cursor {
            bucket,
            position: None,
        }
    }

    pub(crate) fn bucket(&self) -> &Bucket<'tx> {
        &self.bucket
    }

    pub(crate) fn first(&mut self) -> Option<(Slice, Option<Slice>)> {
        self.load(|node| node.first().map(owned_pair))
    }

    pub(crate) fn last(&mut self) -> Option<(Slice, Option<Slice>)> {
        self.load(|node| node.last().map(owned_pair))
    }

    /// Position at the smallest key >= `target`.
    pub(crate) fn seek(&mut self, target: &[u8]) -> Option<(Slice, Option<Slice>)> {
        self.load(|node| node.seek(target).map(owned_pair))
    }

    pub(crate) fn next(&mut self) -> Option<(Slice, Option<Slice>)> {
        let position = self.position.clone()?;
        self.load(move |node| node.next_after(&position).map(owned_pair))
    }

    pub(crate) fn prev(&mut self) -> Option<(Slice, Option<Slice>)> {
        let position = self.position.clone()?;
        self.load(move |node| node.prev_before(&position).map(owned_pair))
    }

    fn load(
        &mut self,
        query: impl FnOnce(&Node) -> Option<(Vec<u8>, Option<Vec<u8>>)>,
    ) -> Option<(Slice, Option<Slice>)> {
        // A bucket deleted out from under the cursor reads as exhausted.
        let found = self.bucket.with_node(query).unwrap_or(None);
        match found {
            Some((key, value)) => {
                self.position = Some(key.clone());
                Some((Slice::new(key), value.map(Slice::new)))
            }
            None => {
                self.position = None;
                None
            }
        }
    }
}

fn owned_pair((key, entry): (&Vec<u8>, &Entry)) -> (Vec<u8>, Option<Vec<u8>>) {
    (key.clone(), entry.value().map(|value| value.to_vec()))
}

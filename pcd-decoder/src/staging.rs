use std::{
    cell::Cell,
    ops::{Deref, DerefMut},
};

/// Scratch memory handed across the codec boundary.
///
/// Regions are only reachable through [`StagingBuffer`] guards, which give their bytes back
/// when dropped, so an early return cannot leak them. The heap is single-threaded; each worker
/// owns its own.
#[derive(Debug, Default)]
pub struct StagingHeap {
    live: Cell<usize>,
    peak: Cell<usize>,
}

impl StagingHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&self, len: usize) -> StagingBuffer<'_> {
        self.acquire(vec![0; len])
    }

    /// Copies `bytes` into a fresh region.
    pub fn stage(&self, bytes: &[u8]) -> StagingBuffer<'_> {
        self.acquire(bytes.to_vec())
    }

    /// Bytes currently held by outstanding guards.
    pub fn live_bytes(&self) -> usize {
        self.live.get()
    }

    pub fn peak_bytes(&self) -> usize {
        self.peak.get()
    }

    fn acquire(&self, bytes: Vec<u8>) -> StagingBuffer<'_> {
        let live = self.live.get() + bytes.len();
        self.live.set(live);
        self.peak.set(self.peak.get().max(live));
        log::trace!("staging: acquired {} bytes ({live} live)", bytes.len());
        StagingBuffer { heap: self, bytes }
    }
}

#[derive(Debug)]
pub struct StagingBuffer<'h> {
    heap: &'h StagingHeap,
    bytes: Vec<u8>,
}

impl Deref for StagingBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for StagingBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Drop for StagingBuffer<'_> {
    fn drop(&mut self) {
        let live = self.heap.live.get() - self.bytes.len();
        self.heap.live.set(live);
        log::trace!("staging: released {} bytes ({live} live)", self.bytes.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards_release_on_drop() {
        let heap = StagingHeap::new();
        {
            let input = heap.stage(&[1, 2, 3]);
            let mut record = heap.alloc(5);
            record[0] = 9;
            assert_eq!(&input[..], &[1, 2, 3]);
            assert_eq!(record[0], 9);
            assert_eq!(heap.live_bytes(), 8);
        }
        assert_eq!(heap.live_bytes(), 0);
        assert_eq!(heap.peak_bytes(), 8);
    }

    #[test]
    fn test_release_on_early_return() {
        fn fails(heap: &StagingHeap) -> Result<(), ()> {
            let _scratch = heap.alloc(64);
            Err(())
        }

        let heap = StagingHeap::new();
        assert!(fails(&heap).is_err());
        assert_eq!(heap.live_bytes(), 0);
    }
}

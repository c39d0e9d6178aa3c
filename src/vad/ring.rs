//! Fixed-size byte ring bank backing clip retention and extraction.
//!
//! Four identically-sized rings, one active at a time. Writes only ever
//! touch the active ring; on rotation the next ring becomes active and is
//! cleared while the bytes of the one just vacated are handed to the caller
//! (who owns them for as long as it takes to serialize a clip to disk).
//! Unlike `examples/poodle64-thoth/src-tauri/src/audio/ring_buffer.rs`'s
//! single `f32` SPSC ring sized for live device capture, this bank holds
//! four byte rings and is driven from a single task (the detector), so no
//! atomics or `unsafe impl Send/Sync` are needed — ordinary `Vec<u8>` with
//! head/len bookkeeping is enough.

const RING_COUNT: usize = 4;

/// One fixed-capacity byte ring.
#[derive(Debug, Clone)]
struct Ring {
    capacity: usize,
    data: Vec<u8>,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Ring {
            capacity,
            data: Vec::with_capacity(capacity),
        }
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    /// Appends `bytes`, discarding the oldest bytes first if the write would
    /// overflow capacity. Never blocks, never fails.
    fn write(&mut self, bytes: &[u8]) {
        if bytes.len() >= self.capacity {
            // The new write alone fills (or exceeds) capacity; keep only its tail.
            let start = bytes.len() - self.capacity;
            self.data.clear();
            self.data.extend_from_slice(&bytes[start..]);
            return;
        }
        let free = self.capacity - self.data.len();
        if bytes.len() > free {
            let advance = bytes.len() - free;
            self.data.drain(0..advance);
        }
        self.data.extend_from_slice(bytes);
    }
}

/// An ordered collection of exactly four fixed-capacity byte rings, one of
/// which is active at any time.
#[derive(Debug, Clone)]
pub struct RingBank {
    rings: [Ring; RING_COUNT],
    active: usize,
}

impl RingBank {
    /// Builds a bank of four rings each with the given byte capacity.
    pub fn new(capacity_bytes: usize) -> Self {
        RingBank {
            rings: std::array::from_fn(|_| Ring::new(capacity_bytes)),
            active: 0,
        }
    }

    /// Writes to the active ring, advancing the oldest bytes to make room
    /// on overflow.
    pub fn write_active(&mut self, bytes: &[u8]) {
        self.rings[self.active].write(bytes);
    }

    /// The bytes currently held in the active ring, oldest first.
    pub fn active_bytes(&self) -> &[u8] {
        &self.rings[self.active].data
    }

    /// Clears the active ring in place, without rotating.
    pub fn reset_active(&mut self) {
        self.rings[self.active].clear();
    }

    /// Rotates to the next ring (mod 4), clearing it, and returns a copy of
    /// the bytes held by the ring that was just vacated.
    ///
    /// The spec models this as an immutable borrow of the previously active
    /// ring that "must remain valid" while downstream consumes it; expressing
    /// that borrow statically across the `await` points between emission and
    /// disk serialization would need unsound self-referential state, so this
    /// returns an owned copy instead (one allocation + memcpy per emission,
    /// see DESIGN.md).
    pub fn rotate(&mut self) -> Vec<u8> {
        let vacated = self.rings[self.active].data.clone();
        self.active = (self.active + 1) % RING_COUNT;
        self.rings[self.active].clear();
        vacated
    }

    /// Length in bytes currently held in the active ring.
    pub fn active_len(&self) -> usize {
        self.rings[self.active].len()
    }
}

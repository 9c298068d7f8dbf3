//! Simulated post-transform vertex cache.
//!
//! Strict FIFO: a hit leaves the order untouched, a miss inserts the vertex at
//! position 0 and pushes every resident one slot back, evicting the oldest
//! entry once the cache is full.

const NEVER_INSERTED: usize = usize::MAX;

/// Outcome of [`SimulatedCache::touch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Touch {
    Hit,
    Miss { evicted: Option<u32> },
}

impl Touch {
    pub fn is_hit(&self) -> bool {
        matches!(self, Touch::Hit)
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedCache {
    capacity: usize,
    // ring[stamp % ring.len()] holds the vertex inserted at that stamp
    ring: Vec<u32>,
    // vertex id -> stamp of its latest insertion
    stamps: Vec<usize>,
    clock: usize,
}

impl SimulatedCache {
    /// Creates an empty cache for vertex ids in `0..vertex_count`.
    ///
    /// The ring never needs more slots than there are vertices, so a huge
    /// capacity does not allocate more than `vertex_count` entries.
    pub fn new(capacity: usize, vertex_count: usize) -> Self {
        let ring_len = capacity.min(vertex_count).max(1);
        Self {
            capacity,
            ring: vec![0; ring_len],
            stamps: vec![NEVER_INSERTED; vertex_count],
            clock: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.clock.min(self.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.clock == 0
    }

    pub fn position_of(&self, vertex: u32) -> Option<usize> {
        let stamp = *self.stamps.get(vertex as usize)?;
        if stamp == NEVER_INSERTED {
            return None;
        }
        let pos = self.clock - stamp - 1;
        (pos < self.capacity).then_some(pos)
    }

    pub fn contains(&self, vertex: u32) -> bool {
        self.position_of(vertex).is_some()
    }

    pub fn touch(&mut self, vertex: u32) -> Touch {
        if self.contains(vertex) {
            return Touch::Hit;
        }

        let evicted = if self.clock >= self.capacity {
            let oldest = self.clock - self.capacity;
            Some(self.ring[oldest % self.ring.len()])
        } else {
            None
        };

        let slot = self.clock % self.ring.len();
        self.ring[slot] = vertex;
        self.stamps[vertex as usize] = self.clock;
        self.clock += 1;

        Touch::Miss { evicted }
    }

    /// Resident vertices, most recently inserted first.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        let len = self.len();
        (0..len).map(move |pos| {
            let stamp = self.clock - pos - 1;
            self.ring[stamp % self.ring.len()]
        })
    }

    pub fn clear(&mut self) {
        // evicted vertices keep stale stamps too, so reset all of them
        self.stamps.fill(NEVER_INSERTED);
        self.clock = 0;
    }
}

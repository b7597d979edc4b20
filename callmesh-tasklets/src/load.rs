//! Resource-pressure primitives backing the cpu and ram tasklets.

/// Fraction of one core the cpu tasklet consumes.
pub const CPU_FRACTION: f64 = 0.25;

/// Size of the region the ram tasklet holds (100 MiB).
pub const RAM_BYTES: usize = 100 * 1024 * 1024;

/// Busy-loop iterations per microsecond.
///
/// Statically calibrated; the absolute load only needs to be roughly stable,
/// not exact, since the tasklet models relative CPU pressure.
const SPINS_PER_US: u64 = 3300;

/// Assumed page size for the touch stride.
const PAGE_SIZE: usize = 4096;

/// Keep the CPU busy for about `us` microseconds.
pub(crate) fn spin_for_us(us: u64) {
    let count = us * SPINS_PER_US;
    let mut x = 0u64;
    let mut y = 1u64;
    for _ in 0..count {
        let t = std::hint::black_box(x);
        x = std::hint::black_box(y);
        y = t;
    }
}

/// An anonymous memory region kept resident by periodic page touches.
///
/// Writing one byte per page defeats lazy and copy-on-write allocation, so
/// the region shows up as real RSS. The stride is 80% of a page so drift
/// never skips a page across sweeps.
pub(crate) struct TouchedRegion {
    buf: Vec<u8>,
}

impl TouchedRegion {
    /// Allocate a region of the given size.
    pub(crate) fn allocate(bytes: usize) -> Self {
        Self {
            buf: vec![0u8; bytes],
        }
    }

    /// Write one byte per page across the whole region.
    pub(crate) fn touch(&mut self) {
        let stride = PAGE_SIZE * 4 / 5;
        let mut i = 0;
        while i < self.buf.len() {
            self.buf[i] = self.buf[i].wrapping_add(1);
            i += stride;
        }
    }
}

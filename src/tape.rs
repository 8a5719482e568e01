//! The memory tape: a contiguous block of byte cells that grows on demand in
//! both directions.
//!
//! Only a window of the conceptually infinite tape is materialized. When the
//! head walks off either end, the block is extended by [`GROWTH_CHUNK`] zeroed
//! cells. Growing to the left shifts every existing cell up by one chunk and
//! re-points the head so it still denotes the same logical cell.

/// Number of cells materialized when a tape is created.
pub const INITIAL_TAPE_SIZE: usize = 64;

/// Number of cells added each time the head walks past an edge.
pub const GROWTH_CHUNK: usize = 64;

/// A bidirectionally growable tape of `u8` cells with a single head.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<u8>,
    head: usize,
    // Block offset of the cell the head started on; shifts with leftward growth.
    origin: usize,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    /// Create a zeroed tape of [`INITIAL_TAPE_SIZE`] cells with the head at
    /// its midpoint.
    pub fn new() -> Self {
        Self::with_size(INITIAL_TAPE_SIZE)
    }

    /// Create a zeroed tape of `size` cells (at least one) with the head at
    /// its midpoint.
    pub fn with_size(size: usize) -> Self {
        let size = size.max(1);
        Self {
            cells: vec![0; size],
            head: size / 2,
            origin: size / 2,
        }
    }

    /// Value of the current cell.
    pub fn get_current(&self) -> u8 {
        self.cells[self.head]
    }

    /// Overwrite the current cell.
    pub fn set_current(&mut self, value: u8) {
        self.cells[self.head] = value;
    }

    pub fn increment(&mut self) {
        let cell = &mut self.cells[self.head];
        *cell = cell.wrapping_add(1);
    }

    pub fn decrement(&mut self) {
        let cell = &mut self.cells[self.head];
        *cell = cell.wrapping_sub(1);
    }

    /// Move the head one cell to the right, growing the block upward when the
    /// head passes its last cell.
    pub fn move_right(&mut self) {
        self.head += 1;
        if self.head == self.cells.len() {
            self.cells.resize(self.cells.len() + GROWTH_CHUNK, 0);
        }
    }

    /// Move the head one cell to the left, growing the block downward when the
    /// head sits on the first cell.
    pub fn move_left(&mut self) {
        if self.head == 0 {
            self.grow_left();
        }
        self.head -= 1;
    }

    fn grow_left(&mut self) {
        let old_len = self.cells.len();
        self.cells.resize(old_len + GROWTH_CHUNK, 0);
        self.cells.copy_within(0..old_len, GROWTH_CHUNK);
        self.cells[..GROWTH_CHUNK].fill(0);
        self.head += GROWTH_CHUNK;
        self.origin += GROWTH_CHUNK;
    }

    /// Offset of the head inside the materialized block.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Logical position of the head relative to the starting cell. Unlike
    /// [`Tape::head`] this does not change when the block grows leftward.
    pub fn position(&self) -> isize {
        self.head as isize - self.origin as isize
    }

    /// The materialized block.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Number of materialized cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed_with_head_at_midpoint() {
        let tape = Tape::new();
        assert_eq!(tape.len(), INITIAL_TAPE_SIZE);
        assert_eq!(tape.head(), INITIAL_TAPE_SIZE / 2);
        assert_eq!(tape.position(), 0);
        assert!(tape.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn increment_and_decrement_wrap() {
        let mut tape = Tape::new();
        tape.decrement();
        assert_eq!(tape.get_current(), 255);
        tape.increment();
        assert_eq!(tape.get_current(), 0);
        for _ in 0..257 {
            tape.increment();
        }
        assert_eq!(tape.get_current(), 1);
    }

    #[test]
    fn right_growth_appends_zeroed_chunk() {
        let mut tape = Tape::with_size(4);
        tape.set_current(9);
        tape.move_right();
        tape.move_right();
        assert_eq!(tape.len(), 4 + GROWTH_CHUNK);
        assert_eq!(tape.head(), 4);
        assert_eq!(tape.get_current(), 0);
        assert_eq!(tape.cells()[2], 9);
    }

    #[test]
    fn left_growth_preserves_cells_and_logical_head() {
        let mut tape = Tape::with_size(4);
        // Head starts at offset 2; mark cells 0..=2.
        tape.set_current(3);
        tape.move_left();
        tape.set_current(2);
        tape.move_left();
        tape.set_current(1);
        assert_eq!(tape.head(), 0);

        tape.move_left();
        assert_eq!(tape.len(), 4 + GROWTH_CHUNK);
        assert_eq!(tape.head(), GROWTH_CHUNK - 1);
        assert_eq!(tape.position(), -3);
        assert_eq!(tape.get_current(), 0);

        tape.move_right();
        assert_eq!(tape.get_current(), 1);
        tape.move_right();
        assert_eq!(tape.get_current(), 2);
        tape.move_right();
        assert_eq!(tape.get_current(), 3);
        assert_eq!(tape.position(), 0);
        assert!(tape.cells()[..GROWTH_CHUNK].iter().all(|&c| c == 0));
    }

    #[test]
    fn long_excursions_return_to_the_same_cell() {
        for n in [1usize, 63, 64, 65, 200, 1000] {
            let mut tape = Tape::new();
            tape.set_current(42);

            for _ in 0..n {
                tape.move_right();
            }
            for _ in 0..n {
                tape.move_left();
            }
            assert_eq!(tape.get_current(), 42, "right excursion of {n}");

            for _ in 0..n {
                tape.move_left();
            }
            for _ in 0..n {
                tape.move_right();
            }
            assert_eq!(tape.get_current(), 42, "left excursion of {n}");
            assert_eq!(tape.position(), 0);
        }
    }

    #[test]
    fn single_cell_tape_grows_both_ways() {
        let mut tape = Tape::with_size(0);
        assert_eq!(tape.len(), 1);
        tape.set_current(7);
        tape.move_left();
        tape.move_right();
        tape.move_right();
        tape.move_left();
        assert_eq!(tape.get_current(), 7);
        assert_eq!(tape.len(), 1 + 2 * GROWTH_CHUNK);
    }
}

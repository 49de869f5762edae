//! Dense, bounds-checked 2D grid.

/// Owned row-major 2D grid indexed by `(row, col)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid2<T> {
    /// Grid with every cell set to `fill`.
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![fill; rows * cols],
        }
    }
}

impl<T> Grid2<T> {
    /// Wrap row-major data. Returns `None` when `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        (rows.checked_mul(cols) == Some(data.len())).then_some(Self { rows, cols, data })
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total cell count.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a grid without cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Cell at `(row, col)`, `None` when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.index(row, col).map(|i| &self.data[i])
    }

    /// Mutable cell at `(row, col)`.
    #[inline]
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        self.index(row, col).map(move |i| &mut self.data[i])
    }

    /// Overwrite a cell. Returns `false` (and drops `value`) when out of bounds.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        match self.get_mut(row, col) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Row-major cell slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over `((row, col), cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        let cols = self.cols.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| ((i / cols, i % cols), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_checked_access() {
        let mut grid = Grid2::new(2, 3, 0u8);
        assert_eq!(grid.len(), 6);
        assert!(grid.set(1, 2, 9));
        assert!(!grid.set(2, 0, 9));
        assert!(!grid.set(0, 3, 9));

        assert_eq!(grid.get(1, 2), Some(&9));
        assert_eq!(grid.get(0, 0), Some(&0));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.get(usize::MAX, usize::MAX), None);
    }

    #[test]
    fn test_row_major_layout() {
        let grid = Grid2::from_vec(2, 2, vec!['a', 'b', 'c', 'd']).unwrap();
        assert_eq!(grid.get(1, 0), Some(&'c'));
        let cells: Vec<_> = grid.iter().collect();
        assert_eq!(cells[3], ((1, 1), &'d'));
        assert!(Grid2::from_vec(2, 2, vec![1]).is_none());
    }
}

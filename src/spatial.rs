//! Uniform grid for neighbour queries.
//!
//! Particles are bucketed into square cells one link distance wide, so any
//! pair closer than the link distance sits in the same or an adjacent cell.
//! The table is built like a counting sort: count per cell, prefix-sum into
//! `cell_start`, then scatter particle indices. Within a cell indices stay in
//! ascending order.
//!
//! Particles outside the viewport are clamped into the border cells. Clamping
//! never pushes two nearby particles more than one cell apart, so no link is
//! lost.

use glam::Vec2;

use crate::particle::{Bounds, Particle};

/// Upper bound on cells per axis; larger viewports get wider cells.
const MAX_AXIS_CELLS: usize = 1024;

/// Offsets of the 3x3 block of cells around (and including) a cell.
#[rustfmt::skip]
const NEIGHBOR_OFFSETS: [(i64, i64); 9] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0), (0,  0), (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

/// Reusable cell table.
#[derive(Debug, Default, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    /// Cell of each particle, by particle index.
    cell_of: Vec<usize>,
    /// First slot in `sorted` for each cell; has `cols * rows + 1` entries.
    cell_start: Vec<usize>,
    /// Particle indices grouped by cell.
    sorted: Vec<usize>,
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn axis_cell(v: f32, cell_size: f32, count: usize) -> usize {
        let c = (v / cell_size).floor();
        if c.is_nan() || c < 0.0 {
            0
        } else {
            (c as usize).min(count - 1)
        }
    }

    fn cell_coords(&self, p: Vec2) -> (usize, usize) {
        (
            Self::axis_cell(p.x, self.cell_size, self.cols),
            Self::axis_cell(p.y, self.cell_size, self.rows),
        )
    }

    /// Rebuild the table for the current particle positions.
    pub fn rebuild(&mut self, particles: &[Particle], bounds: Bounds, cell_size: f32) {
        // Cells may be wider than asked for, never narrower.
        let mut cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            f32::INFINITY
        };
        let longest = bounds.width.max(bounds.height);
        if longest.is_finite() && longest / cell_size > MAX_AXIS_CELLS as f32 {
            cell_size = longest / MAX_AXIS_CELLS as f32;
        }

        let extent = |v: f32| {
            if v.is_finite() && v > 0.0 {
                ((v / cell_size).ceil() as usize).max(1)
            } else {
                1
            }
        };
        self.cell_size = cell_size;
        self.cols = extent(bounds.width);
        self.rows = extent(bounds.height);
        let cells = self.cols * self.rows;

        self.cell_of.clear();
        self.cell_start.clear();
        self.cell_start.resize(cells + 1, 0);

        for p in particles {
            let (cx, cy) = self.cell_coords(p.position);
            let cell = cy * self.cols + cx;
            self.cell_of.push(cell);
            self.cell_start[cell + 1] += 1;
        }
        for i in 0..cells {
            self.cell_start[i + 1] += self.cell_start[i];
        }

        self.sorted.clear();
        self.sorted.resize(particles.len(), 0);
        let mut cursor = self.cell_start.clone();
        for (index, &cell) in self.cell_of.iter().enumerate() {
            self.sorted[cursor[cell]] = index;
            cursor[cell] += 1;
        }
    }

    /// Indices of the particles in one cell.
    pub fn cell(&self, cx: usize, cy: usize) -> &[usize] {
        let cell = cy * self.cols + cx;
        &self.sorted[self.cell_start[cell]..self.cell_start[cell + 1]]
    }

    /// Call `visit(i, j)` once for every unordered pair `i < j` whose cells
    /// touch. Candidates still need an exact distance test.
    pub fn for_each_candidate_pair(&self, mut visit: impl FnMut(usize, usize)) {
        for (i, &cell) in self.cell_of.iter().enumerate() {
            let cx = (cell % self.cols) as i64;
            let cy = (cell / self.cols) as i64;
            for (dx, dy) in NEIGHBOR_OFFSETS {
                let (nx, ny) = (cx + dx, cy + dy);
                if nx < 0 || ny < 0 || nx >= self.cols as i64 || ny >= self.rows as i64 {
                    continue;
                }
                for &j in self.cell(nx as usize, ny as usize) {
                    if j > i {
                        visit(i, j);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn at(x: f32, y: f32) -> Particle {
        Particle::new(Vec2::new(x, y), Vec2::ZERO, 2.0, 1.0)
    }

    #[test]
    fn test_rebuild_buckets_particles() {
        let particles = [at(5.0, 5.0), at(150.0, 5.0), at(15.0, 8.0), at(250.0, 250.0)];
        let mut grid = SpatialGrid::new();
        grid.rebuild(&particles, Bounds::new(300.0, 300.0), 100.0);

        assert_eq!((grid.cols(), grid.rows()), (3, 3));
        assert_eq!(grid.cell(0, 0), &[0, 2]);
        assert_eq!(grid.cell(1, 0), &[1]);
        assert_eq!(grid.cell(2, 2), &[3]);
        assert!(grid.cell(1, 1).is_empty());
    }

    #[test]
    fn test_out_of_bounds_particles_are_clamped() {
        let particles = [at(-3.0, -3.0), at(305.0, 120.0), at(f32::NAN, 10.0)];
        let mut grid = SpatialGrid::new();
        grid.rebuild(&particles, Bounds::new(300.0, 300.0), 100.0);
        assert_eq!(grid.cell(0, 0), &[0, 2]);
        assert_eq!(grid.cell(2, 1), &[1]);
    }

    #[test]
    fn test_candidates_cover_all_close_pairs() {
        let mut rng = StdRng::seed_from_u64(99);
        let bounds = Bounds::new(500.0, 400.0);
        let particles: Vec<Particle> = (0..300)
            .map(|_| at(rng.gen_range(-20.0..520.0), rng.gen_range(-20.0..420.0)))
            .collect();

        let mut grid = SpatialGrid::new();
        grid.rebuild(&particles, bounds, 100.0);

        let mut candidates = Vec::new();
        grid.for_each_candidate_pair(|i, j| candidates.push((i, j)));
        candidates.sort_unstable();
        let before = candidates.len();
        candidates.dedup();
        assert_eq!(before, candidates.len(), "pair visited twice");

        for i in 0..particles.len() {
            for j in (i + 1)..particles.len() {
                if particles[i].position.distance(particles[j].position) < 100.0 {
                    assert!(candidates.binary_search(&(i, j)).is_ok(), "missed ({i}, {j})");
                }
            }
        }
    }

    #[test]
    fn test_empty_bounds_use_single_cell() {
        let particles = [at(0.0, 0.0), at(1.0, 1.0)];
        let mut grid = SpatialGrid::new();
        grid.rebuild(&particles, Bounds::default(), 100.0);
        assert_eq!((grid.cols(), grid.rows()), (1, 1));
        let mut pairs = Vec::new();
        grid.for_each_candidate_pair(|i, j| pairs.push((i, j)));
        assert_eq!(pairs, vec![(0, 1)]);
    }
}

use flock_common::{Agent, Vector2};

/// Upper bound on grid cells per agent before cells are coarsened.
const MAX_CELLS_PER_AGENT: usize = 4;
const MIN_CELLS: usize = 1024;

/// Uniform grid over the flock's bounding box, rebuilt every tick with a counting sort.
///
/// Cells are at least as wide as the largest perception radius, so every agent within
/// range of a position lies in the 3x3 block of cells around it.
#[derive(Debug, Default)]
pub struct NeighborGrid {
    cell_size: f64,
    inv_cell_size: f64,
    origin: Vector2,
    dim_x: usize,
    dim_y: usize,
    // Grid cell index for each agent
    agent_cells: Vec<u32>,
    // Number of agents in each grid cell
    cell_counts: Vec<u32>,
    // Start index in cell_agents for each grid cell (prefix sum)
    cell_starts: Vec<u32>,
    // Agent indices sorted by grid cell
    cell_agents: Vec<u32>,
}

impl NeighborGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.dim_x, self.dim_y)
    }

    /// Rebuilds the grid for `agents` with cells no smaller than `radius`.
    pub fn rebuild(&mut self, agents: &[Agent], radius: f64) {
        let n = agents.len();

        // Bounding box over finite positions. Anything else is clamped into the edge cells.
        let mut min = Vector2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Vector2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for agent in agents {
            let p = agent.position;
            if p.x.is_finite() && p.y.is_finite() {
                min = Vector2::new(min.x.min(p.x), min.y.min(p.y));
                max = Vector2::new(max.x.max(p.x), max.y.max(p.y));
            }
        }
        if min.x > max.x {
            min = Vector2::zero();
            max = Vector2::zero();
        }

        let mut cell_size = if radius > 0.0 && radius.is_finite() { radius } else { 1.0 };
        let max_cells = (n * MAX_CELLS_PER_AGENT).max(MIN_CELLS);
        let (mut dim_x, mut dim_y) = grid_dims(max.sub(min), cell_size);
        while dim_x.saturating_mul(dim_y) > max_cells {
            cell_size *= 2.0;
            (dim_x, dim_y) = grid_dims(max.sub(min), cell_size);
        }

        self.cell_size = cell_size;
        self.inv_cell_size = 1.0 / cell_size;
        self.origin = min;
        self.dim_x = dim_x;
        self.dim_y = dim_y;
        let num_cells = dim_x * dim_y;

        // Phase 1: Assign a cell to each agent.
        let agent_cells: Vec<u32> = agents.iter().map(|a| self.cell_of(a.position) as u32).collect();
        self.agent_cells = agent_cells;

        // Phase 2: Count agents per cell.
        self.cell_counts.clear();
        self.cell_counts.resize(num_cells, 0);
        for &cell in &self.agent_cells {
            self.cell_counts[cell as usize] += 1;
        }

        // Phase 3: Prefix sum for cell start indices.
        self.cell_starts.clear();
        self.cell_starts.resize(num_cells, 0);
        let mut total = 0u32;
        for (start, &count) in self.cell_starts.iter_mut().zip(&self.cell_counts) {
            *start = total;
            total += count;
        }

        // Phase 4: Scatter agent indices. Ascending agent order is kept within each cell.
        self.cell_agents.clear();
        self.cell_agents.resize(n, 0);
        let mut write_offsets = self.cell_starts.clone();
        for (idx, &cell) in self.agent_cells.iter().enumerate() {
            let slot = &mut write_offsets[cell as usize];
            self.cell_agents[*slot as usize] = idx as u32;
            *slot += 1;
        }
    }

    fn cell_coords(&self, pos: Vector2) -> (i64, i64) {
        // `as` saturates, and NaN lands on 0.
        let gx = ((pos.x - self.origin.x) * self.inv_cell_size).floor() as i64;
        let gy = ((pos.y - self.origin.y) * self.inv_cell_size).floor() as i64;
        (
            gx.clamp(0, self.dim_x as i64 - 1),
            gy.clamp(0, self.dim_y as i64 - 1),
        )
    }

    /// Calculates the 1D grid cell index for a given position.
    pub fn cell_of(&self, pos: Vector2) -> usize {
        let (gx, gy) = self.cell_coords(pos);
        gy as usize * self.dim_x + gx as usize
    }

    /// Collects every agent in the 3x3 block around `pos` except `agent_idx`, in ascending index order.
    pub fn candidates(&self, agent_idx: usize, pos: Vector2, out: &mut Vec<usize>) {
        out.clear();
        if self.cell_counts.is_empty() {
            return;
        }
        let (cx, cy) = self.cell_coords(pos);

        for dy in -1..=1 {
            let y = cy + dy;
            if y < 0 || y >= self.dim_y as i64 {
                continue;
            }
            for dx in -1..=1 {
                let x = cx + dx;
                if x < 0 || x >= self.dim_x as i64 {
                    continue;
                }
                let cell = y as usize * self.dim_x + x as usize;
                let start = self.cell_starts[cell] as usize;
                let end = start + self.cell_counts[cell] as usize;
                out.extend(
                    self.cell_agents[start..end]
                        .iter()
                        .map(|&i| i as usize)
                        .filter(|&i| i != agent_idx),
                );
            }
        }
        out.sort_unstable();
    }
}

fn grid_dims(extent: Vector2, cell_size: f64) -> (usize, usize) {
    let dim_x = ((extent.x / cell_size).floor() as usize).saturating_add(1);
    let dim_y = ((extent.y / cell_size).floor() as usize).saturating_add(1);
    (dim_x, dim_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_common::AgentId;

    fn agents_at(points: &[(f64, f64)]) -> Vec<Agent> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Agent::new(AgentId(i as u64), 0, Vector2::new(x, y), Vector2::zero()))
            .collect()
    }

    #[test]
    fn test_candidates_cover_every_agent_within_radius() {
        let points: Vec<(f64, f64)> = (0..200)
            .map(|i| {
                let t = i as f64;
                ((t * 37.0) % 900.0 - 450.0, (t * 61.0) % 700.0 - 350.0)
            })
            .collect();
        let agents = agents_at(&points);
        let radius = 70.0;
        let mut grid = NeighborGrid::new();
        grid.rebuild(&agents, radius);
        assert!(grid.cell_size() >= radius);

        let mut out = Vec::new();
        for (i, a) in agents.iter().enumerate() {
            grid.candidates(i, a.position, &mut out);
            assert!(!out.contains(&i));
            assert!(out.windows(2).all(|w| w[0] < w[1]));
            for (j, b) in agents.iter().enumerate() {
                if i != j && a.position.distance(b.position) < radius {
                    assert!(out.contains(&j), "agent {} missing neighbor {}", i, j);
                }
            }
        }
    }

    #[test]
    fn test_far_flung_agents_coarsen_the_grid() {
        let agents = agents_at(&[(-1.0e9, -1.0e9), (1.0e9, 1.0e9), (0.0, 0.0)]);
        let mut grid = NeighborGrid::new();
        grid.rebuild(&agents, 10.0);
        let (dx, dy) = grid.dims();
        assert!(dx * dy <= MIN_CELLS);
        let mut out = Vec::new();
        grid.candidates(2, agents[2].position, &mut out);
        assert!(out.len() <= 2);
    }

    #[test]
    fn test_non_finite_positions_do_not_panic() {
        let agents = agents_at(&[(f64::NAN, 0.0), (f64::INFINITY, 1.0), (0.0, 0.0)]);
        let mut grid = NeighborGrid::new();
        grid.rebuild(&agents, 50.0);
        let mut out = Vec::new();
        grid.candidates(0, agents[0].position, &mut out);
        grid.candidates(2, agents[2].position, &mut out);
    }

    #[test]
    fn test_empty_flock() {
        let mut grid = NeighborGrid::new();
        grid.rebuild(&[], 50.0);
        let mut out = vec![1, 2, 3];
        grid.candidates(0, Vector2::zero(), &mut out);
        assert!(out.is_empty());
    }
}

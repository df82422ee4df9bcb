#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state for the Gridfall simulation.
//!
//! The grid owns cell classification and tower occupancy, converts between
//! discrete cell coordinates and continuous world coordinates, and carries
//! the enemy route computed at load time. Route computation itself lives in
//! [`pathfinding`].

use gridfall_core::{CellKind, GridPos, TowerId, WorldPoint};
use thiserror::Error;

pub mod pathfinding;

/// Error raised when a level layout cannot be turned into a grid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The layout contained no rows or no columns.
    #[error("layout is empty")]
    EmptyLayout,
    /// A row's length differed from the first row's length.
    #[error("layout row {row} has a different length than row 0")]
    RaggedLayout {
        /// Zero-based index of the offending row.
        row: usize,
    },
    /// The layout contained a tile code outside the known set.
    #[error("unknown tile code {code} at ({x}, {y})")]
    UnknownTile {
        /// Unrecognized tile code.
        code: u8,
        /// Column of the offending tile.
        x: u32,
        /// Row of the offending tile.
        y: u32,
    },
    /// No path tile touched the grid border, so no route exists.
    #[error("layout has no path endpoints on the border")]
    MissingEndpoints,
    /// The path tiles do not connect the entry to the exit.
    #[error("no route connects the entry to the exit")]
    NoRoute,
}

/// A single grid cell: its classification plus the tower occupying it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    kind: CellKind,
    tower: Option<TowerId>,
}

impl Cell {
    /// Classification of the cell.
    #[must_use]
    pub const fn kind(&self) -> CellKind {
        self.kind
    }

    /// Tower occupying the cell, if any.
    #[must_use]
    pub const fn tower(&self) -> Option<TowerId> {
        self.tower
    }
}

/// Rectangular playfield storing cells in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    cell_size: f32,
    cells: Vec<Cell>,
    path: Vec<GridPos>,
}

impl Grid {
    /// Builds a grid from a layout matrix of tile codes.
    ///
    /// Code `0` marks empty buildable ground, `1` marks route tiles, and `2`
    /// marks blocked terrain. The enemy route is computed once here: the
    /// border path tiles act as entry and exit, and the connecting route is
    /// found by [`pathfinding::find_route`].
    pub fn from_layout(layout: &[Vec<u8>], cell_size: f32) -> Result<Self, GridError> {
        let height = layout.len();
        if height == 0 || layout[0].is_empty() {
            return Err(GridError::EmptyLayout);
        }
        let width = layout[0].len();

        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in layout.iter().enumerate() {
            if row.len() != width {
                return Err(GridError::RaggedLayout { row: y });
            }
            for (x, &code) in row.iter().enumerate() {
                let kind = match code {
                    0 => CellKind::Empty,
                    1 => CellKind::Path,
                    2 => CellKind::Blocked,
                    _ => {
                        return Err(GridError::UnknownTile {
                            code,
                            x: x as u32,
                            y: y as u32,
                        })
                    }
                };
                cells.push(Cell { kind, tower: None });
            }
        }

        let mut grid = Self {
            width: width as u32,
            height: height as u32,
            cell_size,
            cells,
            path: Vec::new(),
        };

        let (entry, exit) = grid.border_endpoints().ok_or(GridError::MissingEndpoints)?;
        let route = pathfinding::find_route(&grid, entry, exit);
        if route.is_empty() {
            return Err(GridError::NoRoute);
        }
        log::debug!(
            "grid {}x{} routed {} -> {} over {} cells",
            grid.width,
            grid.height,
            entry.x(),
            exit.x(),
            route.len()
        );
        grid.path = route;
        Ok(grid)
    }

    /// Finds the entry and exit of the route among border path tiles.
    ///
    /// The lexicographically smallest border path tile (by column, then row)
    /// is the entry and the largest is the exit, which keeps route direction
    /// stable for any layout with exactly two border openings.
    fn border_endpoints(&self) -> Option<(GridPos, GridPos)> {
        let mut endpoints: Vec<GridPos> = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = GridPos::new(x, y);
                let on_border =
                    x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1;
                if on_border && self.cell(pos).map(Cell::kind) == Some(CellKind::Path) {
                    endpoints.push(pos);
                }
            }
        }
        let entry = endpoints.iter().min_by_key(|p| (p.x(), p.y()))?;
        let exit = endpoints.iter().max_by_key(|p| (p.x(), p.y()))?;
        if entry == exit {
            return None;
        }
        Some((*entry, *exit))
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Edge length of a cell in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Ordered enemy route from entry to exit, inclusive.
    #[must_use]
    pub fn path(&self) -> &[GridPos] {
        &self.path
    }

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x() < self.width && pos.y() < self.height
    }

    /// Cell at the given position, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, pos: GridPos) -> Option<&Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.cells.get((pos.y() * self.width + pos.x()) as usize)
    }

    /// Reports whether a tower may be constructed at the position.
    #[must_use]
    pub fn is_buildable(&self, pos: GridPos) -> bool {
        self.cell(pos).map(Cell::kind) == Some(CellKind::Empty)
    }

    /// Marks a cell as occupied by the given tower.
    ///
    /// Callers must have verified buildability; occupying a non-empty cell is
    /// a logic error and is ignored.
    pub fn occupy(&mut self, pos: GridPos, tower: TowerId) {
        if let Some(cell) = self.cell_mut(pos) {
            if cell.kind == CellKind::Empty {
                cell.kind = CellKind::Tower;
                cell.tower = Some(tower);
            }
        }
    }

    /// Clears a tower cell back to empty buildable ground.
    pub fn vacate(&mut self, pos: GridPos) {
        if let Some(cell) = self.cell_mut(pos) {
            if cell.kind == CellKind::Tower {
                cell.kind = CellKind::Empty;
                cell.tower = None;
            }
        }
    }

    fn cell_mut(&mut self, pos: GridPos) -> Option<&mut Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        let index = (pos.y() * self.width + pos.x()) as usize;
        self.cells.get_mut(index)
    }

    /// World position of a cell's top-left corner.
    #[must_use]
    pub fn world_position(&self, pos: GridPos) -> WorldPoint {
        WorldPoint::new(
            pos.x() as f32 * self.cell_size,
            pos.y() as f32 * self.cell_size,
        )
    }

    /// World position of a cell's center.
    #[must_use]
    pub fn cell_center(&self, pos: GridPos) -> WorldPoint {
        let corner = self.world_position(pos);
        WorldPoint::new(
            corner.x + self.cell_size / 2.0,
            corner.y + self.cell_size / 2.0,
        )
    }

    /// Grid position containing a world point, or `None` outside the grid.
    #[must_use]
    pub fn grid_position(&self, point: WorldPoint) -> Option<GridPos> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let pos = GridPos::new(
            (point.x / self.cell_size) as u32,
            (point.y / self.cell_size) as u32,
        );
        self.in_bounds(pos).then_some(pos)
    }
}

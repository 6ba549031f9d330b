use crate::state::{cell_idx, u_idx, v_idx};

/// Field type for boundary condition dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Horizontal velocity on vertical faces, `height x (width + 1)`.
    U,
    /// Vertical velocity on horizontal faces, `(height + 1) x width`.
    V,
    Pressure,
    Temperature,
    /// Derived cell-centered scalar (divergence, vorticity).
    Scalar,
}

impl FieldType {
    pub fn is_velocity(self) -> bool {
        matches!(self, FieldType::U | FieldType::V)
    }
}

/// Per-cell boundary classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellType {
    Solid,
    #[default]
    Fluid,
    Inflow,
    Outflow,
    Periodic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inflow {
    pub velocity: (f64, f64),
    pub temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outflow {
    pub pressure: f64,
}

/// Cell classification plus inflow/outflow profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    width: usize,
    height: usize,
    cells: Vec<CellType>,
    pub inflow: Inflow,
    pub outflow: Outflow,
}

impl Boundary {
    /// Default channel: top/bottom SOLID, left INFLOW, right OUTFLOW, interior FLUID.
    /// Corners belong to the solid walls.
    pub fn new(width: usize, height: usize, inflow: Inflow, outflow: Outflow) -> Self {
        let mut bnd = Self {
            width,
            height,
            cells: vec![CellType::Fluid; width * height],
            inflow,
            outflow,
        };
        for j in 0..height {
            bnd.set(0, j, CellType::Inflow);
            bnd.set(width - 1, j, CellType::Outflow);
        }
        bnd.set_walls();
        bnd
    }

    /// Channel that wraps left/right instead of feeding from an inflow.
    pub fn new_periodic_x(width: usize, height: usize, inflow: Inflow, outflow: Outflow) -> Self {
        let mut bnd = Self::new(width, height, inflow, outflow);
        for j in 0..height {
            bnd.set(0, j, CellType::Periodic);
            bnd.set(width - 1, j, CellType::Periodic);
        }
        bnd.set_walls();
        bnd
    }

    fn set_walls(&mut self) {
        for i in 0..self.width {
            self.set(i, 0, CellType::Solid);
            self.set(i, self.height - 1, CellType::Solid);
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[CellType] {
        &self.cells
    }

    pub fn get(&self, i: usize, j: usize) -> CellType {
        self.cells[cell_idx(i, j, self.width)]
    }

    pub(crate) fn set(&mut self, i: usize, j: usize, cell: CellType) {
        self.cells[cell_idx(i, j, self.width)] = cell;
    }

    #[inline]
    pub fn is_solid(&self, i: usize, j: usize) -> bool {
        self.get(i, j) == CellType::Solid
    }

    pub fn count(&self, cell: CellType) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Whether row `j` wraps between its left and right ends.
    fn row_periodic(&self, j: usize) -> bool {
        self.get(0, j) == CellType::Periodic && self.get(self.width - 1, j) == CellType::Periodic
    }

    /// Whether column `i` wraps between its bottom and top ends.
    fn col_periodic(&self, i: usize) -> bool {
        self.get(i, 0) == CellType::Periodic && self.get(i, self.height - 1) == CellType::Periodic
    }

    /// Offset to the interior neighbor an OUTFLOW cell copies from:
    /// toward whichever side has more interior cells.
    fn outflow_neighbor(&self, i: usize, j: usize) -> (isize, isize) {
        let (w, h) = (self.width, self.height);
        let on_vertical_edge = i == 0 || i == w - 1;
        let on_horizontal_edge = j == 0 || j == h - 1;
        if on_horizontal_edge && !on_vertical_edge {
            if j < h - 1 - j { (0, 1) } else { (0, -1) }
        } else if i < w - 1 - i {
            (1, 0)
        } else {
            (-1, 0)
        }
    }
}

#[inline]
fn offset(i: usize, d: isize) -> usize {
    (i as isize + d) as usize
}

/// Boundary condition handler.
/// Dispatches on the field type; `x` must have the layout that type implies.
pub fn set_bnd(field_type: FieldType, x: &mut [f64], bnd: &Boundary) {
    match field_type {
        FieldType::U => set_bnd_u(x, bnd),
        FieldType::V => set_bnd_v(x, bnd),
        FieldType::Pressure => set_bnd_pressure(x, bnd),
        FieldType::Temperature => set_bnd_temperature(x, bnd),
        FieldType::Scalar => set_bnd_scalar(x, bnd),
    }
}

/// u-faces: zero-gradient walls, inflow profile, outflow copy, periodic wrap,
/// then no-slip at solids (applied last so it always wins).
fn set_bnd_u(u: &mut [f64], bnd: &Boundary) {
    let (w, h) = (bnd.width, bnd.height);

    // Pass 1: generic zero-gradient on the domain edges
    for j in 0..h {
        u[u_idx(0, j, w)] = u[u_idx(1, j, w)];
        u[u_idx(w, j, w)] = u[u_idx(w - 1, j, w)];
    }
    for i in 0..=w {
        u[u_idx(i, 0, w)] = u[u_idx(i, 1, w)];
        u[u_idx(i, h - 1, w)] = u[u_idx(i, h - 2, w)];
    }

    // Pass 2: inflow / outflow cells
    for j in 0..h {
        for i in 0..w {
            match bnd.get(i, j) {
                CellType::Inflow => {
                    u[u_idx(i, j, w)] = bnd.inflow.velocity.0;
                    u[u_idx(i + 1, j, w)] = bnd.inflow.velocity.0;
                }
                CellType::Outflow => {
                    let (di, dj) = bnd.outflow_neighbor(i, j);
                    if di < 0 {
                        u[u_idx(i + 1, j, w)] = u[u_idx(i, j, w)];
                    } else if di > 0 {
                        u[u_idx(i, j, w)] = u[u_idx(i + 1, j, w)];
                    } else {
                        let nj = offset(j, dj);
                        u[u_idx(i, j, w)] = u[u_idx(i, nj, w)];
                        u[u_idx(i + 1, j, w)] = u[u_idx(i + 1, nj, w)];
                    }
                }
                _ => {}
            }
        }
    }

    // Pass 3: periodic wrap (border cells mirror the opposite interior)
    for j in 0..h {
        if bnd.row_periodic(j) {
            u[u_idx(w - 1, j, w)] = u[u_idx(1, j, w)];
            u[u_idx(0, j, w)] = u[u_idx(w - 2, j, w)];
            u[u_idx(w, j, w)] = u[u_idx(2, j, w)];
        }
    }
    for i in 0..w {
        if bnd.col_periodic(i) {
            for f in [i, i + 1] {
                u[u_idx(f, 0, w)] = u[u_idx(f, h - 2, w)];
                u[u_idx(f, h - 1, w)] = u[u_idx(f, 1, w)];
            }
        }
    }

    // Pass 4: no-slip
    for j in 0..h {
        for i in 0..w {
            if bnd.is_solid(i, j) {
                u[u_idx(i, j, w)] = 0.0;
                u[u_idx(i + 1, j, w)] = 0.0;
            }
        }
    }
}

/// v-faces: same policy order as [`set_bnd_u`].
fn set_bnd_v(v: &mut [f64], bnd: &Boundary) {
    let (w, h) = (bnd.width, bnd.height);

    for i in 0..w {
        v[v_idx(i, 0, w)] = v[v_idx(i, 1, w)];
        v[v_idx(i, h, w)] = v[v_idx(i, h - 1, w)];
    }
    for j in 0..=h {
        v[v_idx(0, j, w)] = v[v_idx(1, j, w)];
        v[v_idx(w - 1, j, w)] = v[v_idx(w - 2, j, w)];
    }

    for j in 0..h {
        for i in 0..w {
            match bnd.get(i, j) {
                CellType::Inflow => {
                    v[v_idx(i, j, w)] = bnd.inflow.velocity.1;
                    v[v_idx(i, j + 1, w)] = bnd.inflow.velocity.1;
                }
                CellType::Outflow => {
                    let (di, dj) = bnd.outflow_neighbor(i, j);
                    if dj < 0 {
                        v[v_idx(i, j + 1, w)] = v[v_idx(i, j, w)];
                    } else if dj > 0 {
                        v[v_idx(i, j, w)] = v[v_idx(i, j + 1, w)];
                    } else {
                        let ni = offset(i, di);
                        v[v_idx(i, j, w)] = v[v_idx(ni, j, w)];
                        v[v_idx(i, j + 1, w)] = v[v_idx(ni, j + 1, w)];
                    }
                }
                _ => {}
            }
        }
    }

    for j in 0..h {
        if bnd.row_periodic(j) {
            for f in [j, j + 1] {
                v[v_idx(0, f, w)] = v[v_idx(w - 2, f, w)];
                v[v_idx(w - 1, f, w)] = v[v_idx(1, f, w)];
            }
        }
    }
    for i in 0..w {
        if bnd.col_periodic(i) {
            v[v_idx(i, h - 1, w)] = v[v_idx(i, 1, w)];
            v[v_idx(i, 0, w)] = v[v_idx(i, h - 2, w)];
            v[v_idx(i, h, w)] = v[v_idx(i, 2, w)];
        }
    }

    for j in 0..h {
        for i in 0..w {
            if bnd.is_solid(i, j) {
                v[v_idx(i, j, w)] = 0.0;
                v[v_idx(i, j + 1, w)] = 0.0;
            }
        }
    }
}

/// Zero-gradient copy onto the outer ring of a cell-centered field.
fn copy_border(x: &mut [f64], w: usize, h: usize) {
    for j in 0..h {
        x[cell_idx(0, j, w)] = x[cell_idx(1, j, w)];
        x[cell_idx(w - 1, j, w)] = x[cell_idx(w - 2, j, w)];
    }
    for i in 0..w {
        x[cell_idx(i, 0, w)] = x[cell_idx(i, 1, w)];
        x[cell_idx(i, h - 1, w)] = x[cell_idx(i, h - 2, w)];
    }
}

fn wrap_cells(x: &mut [f64], bnd: &Boundary) {
    let (w, h) = (bnd.width, bnd.height);
    for j in 0..h {
        if bnd.row_periodic(j) {
            x[cell_idx(0, j, w)] = x[cell_idx(w - 2, j, w)];
            x[cell_idx(w - 1, j, w)] = x[cell_idx(1, j, w)];
        }
    }
    for i in 0..w {
        if bnd.col_periodic(i) {
            x[cell_idx(i, 0, w)] = x[cell_idx(i, h - 2, w)];
            x[cell_idx(i, h - 1, w)] = x[cell_idx(i, 1, w)];
        }
    }
}

/// Non-solid 4-neighbors of `(i, j)` in priority order left, right, down, up.
fn open_neighbors(bnd: &Boundary, i: usize, j: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
    let (w, h) = (bnd.width, bnd.height);
    let left = (i > 0).then(|| (i - 1, j));
    let right = (i + 1 < w).then(|| (i + 1, j));
    let down = (j > 0).then(|| (i, j - 1));
    let up = (j + 1 < h).then(|| (i, j + 1));
    [left, right, down, up]
        .into_iter()
        .flatten()
        .filter(move |&(ni, nj)| !bnd.is_solid(ni, nj))
}

/// Average of the non-solid neighbors, or `None` when fully enclosed.
pub(crate) fn open_neighbor_average(x: &[f64], bnd: &Boundary, i: usize, j: usize) -> Option<f64> {
    let w = bnd.width;
    let (sum, count) = open_neighbors(bnd, i, j)
        .fold((0.0, 0usize), |(s, c), (ni, nj)| (s + x[cell_idx(ni, nj, w)], c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Seed solid-cell pressure with the average of its open neighbors.
pub(crate) fn average_into_solids(x: &mut [f64], bnd: &Boundary) {
    let (w, h) = (bnd.width, bnd.height);
    for j in 0..h {
        for i in 0..w {
            if bnd.is_solid(i, j) {
                if let Some(avg) = open_neighbor_average(x, bnd, i, j) {
                    x[cell_idx(i, j, w)] = avg;
                }
            }
        }
    }
}

/// Pressure: zero-gradient walls, fixed value at OUTFLOW, pass-through at
/// INFLOW, periodic wrap, open-neighbor average inside SOLID.
fn set_bnd_pressure(p: &mut [f64], bnd: &Boundary) {
    let (w, h) = (bnd.width, bnd.height);
    copy_border(p, w, h);
    for j in 0..h {
        for i in 0..w {
            if bnd.get(i, j) == CellType::Outflow {
                p[cell_idx(i, j, w)] = bnd.outflow.pressure;
            }
        }
    }
    wrap_cells(p, bnd);
    average_into_solids(p, bnd);
}

/// Temperature: adiabatic walls, inflow temperature, outflow copy, periodic
/// wrap; a solid cell adopts its first open neighbor (left, right, down, up).
fn set_bnd_temperature(t: &mut [f64], bnd: &Boundary) {
    let (w, h) = (bnd.width, bnd.height);
    copy_border(t, w, h);
    for j in 0..h {
        for i in 0..w {
            match bnd.get(i, j) {
                CellType::Inflow => t[cell_idx(i, j, w)] = bnd.inflow.temperature,
                CellType::Outflow => {
                    let (di, dj) = bnd.outflow_neighbor(i, j);
                    t[cell_idx(i, j, w)] = t[cell_idx(offset(i, di), offset(j, dj), w)];
                }
                _ => {}
            }
        }
    }
    wrap_cells(t, bnd);
    for j in 0..h {
        for i in 0..w {
            if bnd.is_solid(i, j) {
                if let Some((ni, nj)) = open_neighbors(bnd, i, j).next() {
                    t[cell_idx(i, j, w)] = t[cell_idx(ni, nj, w)];
                }
            }
        }
    }
}

/// Derived scalars: zero-gradient border, zero inside solids.
fn set_bnd_scalar(x: &mut [f64], bnd: &Boundary) {
    let (w, h) = (bnd.width, bnd.height);
    copy_border(x, w, h);
    wrap_cells(x, bnd);
    for (value, cell) in x.iter_mut().zip(bnd.cells.iter()) {
        if *cell == CellType::Solid {
            *value = 0.0;
        }
    }
}

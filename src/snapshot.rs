use crate::solver::{bilinear, Boundary, CellType};
use crate::state::Field;

/// Min/max aggregates over non-solid cells.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldStats {
    pub min_velocity: f64,
    pub max_velocity: f64,
    pub min_pressure: f64,
    pub max_pressure: f64,
    pub min_vorticity: f64,
    pub max_vorticity: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

/// Read-only copy of everything a renderer needs for one frame.
/// Cell arrays are `width x height`, row-major, row 0 at the bottom.
#[derive(Debug, Clone, Default)]
pub struct VisualizationData {
    pub width: usize,
    pub height: usize,
    pub dx: f64,
    /// Cell-centered speed interpolated from the faces.
    pub velocity_magnitude: Vec<f64>,
    pub pressure: Vec<f64>,
    pub vorticity: Vec<f64>,
    pub temperature: Vec<f64>,
    pub cell_types: Vec<CellType>,
    /// Physical `(x, y)` seed points for streamline tracing.
    pub streamline_seeds: Vec<(f64, f64)>,
    pub stats: FieldStats,
}

/// Interpolated sample at a physical point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProbeData {
    pub x: f64,
    pub y: f64,
    pub u: f64,
    pub v: f64,
    pub speed: f64,
    pub pressure: f64,
    pub vorticity: f64,
    pub temperature: f64,
    /// False outside the domain or inside a solid cell; other values are then zero.
    pub is_valid: bool,
}

fn copy_into(dst: &mut Vec<f64>, src: &[f64]) {
    dst.clear();
    dst.extend_from_slice(src);
}

/// Refill `dst` from the current field, reusing its allocations.
pub fn fill_visualization(dst: &mut VisualizationData, field: &Field, bnd: &Boundary, seed_spacing: usize) {
    let (w, h) = (field.width, field.height);
    dst.width = w;
    dst.height = h;
    dst.dx = field.dx;

    dst.velocity_magnitude.clear();
    for j in 0..h {
        for i in 0..w {
            dst.velocity_magnitude.push(field.cell_speed(i, j));
        }
    }
    copy_into(&mut dst.pressure, &field.pressure);
    copy_into(&mut dst.vorticity, &field.vorticity);
    copy_into(&mut dst.temperature, &field.temperature);
    dst.cell_types.clear();
    dst.cell_types.extend_from_slice(bnd.cells());

    streamline_seeds(&mut dst.streamline_seeds, bnd, field.dx, seed_spacing);
    dst.stats = field_stats(dst, bnd);
}

/// Evenly spaced seeds in FLUID cells plus one at every INFLOW cell.
fn streamline_seeds(seeds: &mut Vec<(f64, f64)>, bnd: &Boundary, dx: f64, spacing: usize) {
    let spacing = spacing.max(1);
    let center = |i: usize, j: usize| ((i as f64 + 0.5) * dx, (j as f64 + 0.5) * dx);
    seeds.clear();
    for j in (spacing / 2..bnd.height()).step_by(spacing) {
        for i in (spacing / 2..bnd.width()).step_by(spacing) {
            if bnd.get(i, j) == CellType::Fluid {
                seeds.push(center(i, j));
            }
        }
    }
    for j in 0..bnd.height() {
        for i in 0..bnd.width() {
            if bnd.get(i, j) == CellType::Inflow {
                seeds.push(center(i, j));
            }
        }
    }
}

fn min_max<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    if lo > hi { (0.0, 0.0) } else { (lo, hi) }
}

fn field_stats(data: &VisualizationData, bnd: &Boundary) -> FieldStats {
    let open = |values: &[f64]| -> (f64, f64) {
        min_max(
            values
                .iter()
                .zip(bnd.cells())
                .filter(|(_, &c)| c != CellType::Solid)
                .map(|(x, _)| x),
        )
    };
    let (min_velocity, max_velocity) = open(&data.velocity_magnitude);
    let (min_pressure, max_pressure) = open(&data.pressure);
    let (min_vorticity, max_vorticity) = open(&data.vorticity);
    let (min_temperature, max_temperature) = open(&data.temperature);
    FieldStats {
        min_velocity,
        max_velocity,
        min_pressure,
        max_pressure,
        min_vorticity,
        max_vorticity,
        min_temperature,
        max_temperature,
    }
}

/// Bilinearly interpolated sample at physical `(x, y)`.
pub fn probe(field: &Field, bnd: &Boundary, x: f64, y: f64) -> ProbeData {
    let (w, h) = (field.width, field.height);
    let invalid = ProbeData { x, y, ..ProbeData::default() };
    let (gx, gy) = (x / field.dx, y / field.dx);
    if !(gx >= 0.0 && gy >= 0.0 && gx < w as f64 && gy < h as f64) {
        return invalid;
    }
    let (ci, cj) = (gx.floor() as usize, gy.floor() as usize);
    if bnd.is_solid(ci, cj) {
        return invalid;
    }

    // u faces sit at integer x, v faces at integer y; scalars at half offsets
    let u = bilinear(&field.u, w + 1, h, gx, gy - 0.5);
    let v = bilinear(&field.v, w, h + 1, gx - 0.5, gy);
    let (sx, sy) = (gx - 0.5, gy - 0.5);
    ProbeData {
        x,
        y,
        u,
        v,
        speed: u.hypot(v),
        pressure: bilinear(&field.pressure, w, h, sx, sy),
        vorticity: bilinear(&field.vorticity, w, h, sx, sy),
        temperature: bilinear(&field.temperature, w, h, sx, sy),
        is_valid: true,
    }
}

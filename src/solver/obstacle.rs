use serde::Deserialize;

use super::boundary::{Boundary, CellType};

/// Solid obstacle in cell-index coordinates.
///
/// YAML form: `{ shape: circle, cx: 20, cy: 25, r: 5 }` or
/// `{ shape: rect, x1: 10, y1: 10, x2: 14, y2: 30 }`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Obstacle {
    Circle { cx: f64, cy: f64, r: f64 },
    Rect { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Obstacle {
    /// Whether the obstacle footprint covers cell `(i, j)`.
    pub fn covers(&self, i: usize, j: usize) -> bool {
        let (x, y) = (i as f64, j as f64);
        match *self {
            Obstacle::Circle { cx, cy, r } => {
                let (dx, dy) = (x - cx, y - cy);
                dx * dx + dy * dy <= r * r
            }
            Obstacle::Rect { x1, y1, x2, y2 } => {
                x >= x1.min(x2) && x <= x1.max(x2) && y >= y1.min(y2) && y <= y1.max(y2)
            }
        }
    }

    /// Mark every covered cell SOLID. Union-only: other cells keep their type.
    /// Returns the number of cells newly turned solid.
    pub fn apply(&self, bnd: &mut Boundary) -> usize {
        let mut added = 0;
        for j in 0..bnd.height() {
            for i in 0..bnd.width() {
                if self.covers(i, j) && !bnd.is_solid(i, j) {
                    bnd.set(i, j, CellType::Solid);
                    added += 1;
                }
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::boundary::{Inflow, Outflow};

    fn channel() -> Boundary {
        Boundary::new(
            20,
            12,
            Inflow { velocity: (1.0, 0.0), temperature: 298.0 },
            Outflow { pressure: 0.0 },
        )
    }

    #[test]
    fn test_circle_footprint() {
        let mut bnd = channel();
        let circle = Obstacle::Circle { cx: 8.0, cy: 6.0, r: 2.0 };
        let added = circle.apply(&mut bnd);
        // r=2 disc on integer lattice: 13 cells
        assert_eq!(added, 13);
        assert!(bnd.is_solid(8, 6));
        assert!(bnd.is_solid(10, 6), "boundary of the disc is inclusive");
        assert!(!bnd.is_solid(10, 7));
    }

    #[test]
    fn test_rect_corners_any_order() {
        let a = Obstacle::Rect { x1: 3.0, y1: 2.0, x2: 5.0, y2: 4.0 };
        let b = Obstacle::Rect { x1: 5.0, y1: 4.0, x2: 3.0, y2: 2.0 };
        for j in 0..12 {
            for i in 0..20 {
                assert_eq!(a.covers(i, j), b.covers(i, j), "cell ({}, {})", i, j);
            }
        }
        assert!(a.covers(3, 2) && a.covers(5, 4));
        assert!(!a.covers(6, 4));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut bnd = channel();
        let rect = Obstacle::Rect { x1: 6.0, y1: 3.0, x2: 9.0, y2: 8.0 };
        let first = rect.apply(&mut bnd);
        let snapshot = bnd.clone();
        let second = rect.apply(&mut bnd);
        assert_eq!(first, 24);
        assert_eq!(second, 0);
        assert_eq!(bnd, snapshot);
    }

    #[test]
    fn test_deserialize_tagged() {
        let yaml = "- shape: circle\n  cx: 4\n  cy: 5\n  r: 1.5\n- shape: rect\n  x1: 1\n  y1: 2\n  x2: 3\n  y2: 4\n";
        let obstacles: Vec<Obstacle> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(obstacles[0], Obstacle::Circle { cx: 4.0, cy: 5.0, r: 1.5 });
        assert_eq!(obstacles[1], Obstacle::Rect { x1: 1.0, y1: 2.0, x2: 3.0, y2: 4.0 });
    }
}

// src/optimization/space.rs

use crate::optimization::Bounds;

/// 設計変数と単位超立方体 [0, 1]^N の間の写像
///
/// 幅 0 の変数（下限 = 上限）は常に下限に写る。
#[derive(Debug, Clone)]
pub struct UnitBox<const N: usize> {
    lower: [f64; N],
    width: [f64; N],
}

impl<const N: usize> UnitBox<N> {
    pub fn new(bounds: &Bounds<N>) -> Self {
        Self {
            lower: bounds.map(|(lo, _)| lo),
            width: bounds.map(|(lo, hi)| (hi - lo).max(0.0)),
        }
    }

    pub fn to_unit(&self, x: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| {
            if self.width[i] > 0.0 {
                ((x[i] - self.lower[i]) / self.width[i]).clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
    }

    pub fn to_design(&self, u: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| self.lower[i] + u[i].clamp(0.0, 1.0) * self.width[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_box_maps_corners() {
        let space = UnitBox::new(&[(1.0, 3.0), (-2.0, 2.0), (5.0, 5.0)]);
        assert_eq!(space.to_unit(&[1.0, 2.0, 5.0]), [0.0, 1.0, 0.0]);
        assert_eq!(space.to_design(&[0.5, 0.25, 0.7]), [2.0, -1.0, 5.0]);
        let back = space.to_design(&space.to_unit(&[2.2, 0.3, 5.0]));
        assert_relative_eq!(back[0], 2.2, epsilon = 1e-12);
        assert_relative_eq!(back[1], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_unit_box_clamps_outside_points() {
        let space = UnitBox::new(&[(0.0, 1.0)]);
        assert_eq!(space.to_unit(&[4.0]), [1.0]);
        assert_eq!(space.to_design(&[-0.5]), [0.0]);
    }
}

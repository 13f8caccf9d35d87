// src/math/linalg.rs

use ndarray::{s, Array1, Array2, ArrayView1};

/// 最大値ノルム
pub fn norm_inf(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

/// コレスキー分解 A = L·Lᵀ
#[derive(Debug, Clone)]
pub struct Cholesky {
    l: Array2<f64>,
}

impl Cholesky {
    /// 対称正定値行列を分解する。正方でないか正定値でなければ `None`。
    pub fn factor(a: &Array2<f64>) -> Option<Self> {
        let n = a.nrows();
        if a.ncols() != n {
            return None;
        }
        let mut l: Array2<f64> = Array2::zeros((n, n));
        for j in 0..n {
            let diag = a[[j, j]] - l.slice(s![j, ..j]).dot(&l.slice(s![j, ..j]));
            if diag <= 0.0 || !diag.is_finite() {
                return None;
            }
            l[[j, j]] = diag.sqrt();
            for i in (j + 1)..n {
                let sum = a[[i, j]] - l.slice(s![i, ..j]).dot(&l.slice(s![j, ..j]));
                l[[i, j]] = sum / l[[j, j]];
            }
        }
        Some(Self { l })
    }

    /// L·y = b を解く
    pub fn forward(&self, b: ArrayView1<f64>) -> Array1<f64> {
        let n = self.l.nrows();
        let mut y: Array1<f64> = Array1::zeros(n);
        for i in 0..n {
            let sum = b[i] - self.l.slice(s![i, ..i]).dot(&y.slice(s![..i]));
            y[i] = sum / self.l[[i, i]];
        }
        y
    }

    /// Lᵀ·x = y を解く
    pub fn backward(&self, y: ArrayView1<f64>) -> Array1<f64> {
        let n = self.l.nrows();
        let mut x: Array1<f64> = Array1::zeros(n);
        for i in (0..n).rev() {
            let sum = y[i] - self.l.slice(s![i + 1.., i]).dot(&x.slice(s![i + 1..]));
            x[i] = sum / self.l[[i, i]];
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_cholesky_solve_spd_system() {
        let a = array![[4.0, 12.0, -16.0], [12.0, 37.0, -43.0], [-16.0, -43.0, 98.0]];
        let b = array![1.0, 2.0, 3.0];
        let chol = Cholesky::factor(&a).unwrap();
        let x = chol.backward(chol.forward(b.view()).view());
        let back = a.dot(&x);
        for i in 0..3 {
            assert_relative_eq!(back[i], b[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_forward_uses_lower_factor() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let chol = Cholesky::factor(&a).unwrap();
        // L = [[2, 0], [1, √2]]
        let y = chol.forward(array![2.0, 1.0].view());
        assert_relative_eq!(y[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(y[1], 0.0, epsilon = 1e-12);
        let x = chol.backward(array![2.0, 2.0_f64.sqrt()].view());
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_cholesky_rejects_indefinite_and_non_square() {
        assert!(Cholesky::factor(&array![[1.0, 2.0], [2.0, 1.0]]).is_none());
        assert!(Cholesky::factor(&Array2::zeros((2, 3))).is_none());
    }

    #[test]
    fn test_norm_inf() {
        assert_eq!(norm_inf(&array![1.0, -5.0, 2.0]), 5.0);
    }
}

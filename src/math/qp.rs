// src/math/qp.rs

use ndarray::{s, Array1, Array2};

use crate::math::linalg::Cholesky;
use crate::math::nnls::nnls;

/// 求めた解が満たすべき制約の相対精度
const FEASIBILITY_ACCURACY: f64 = 1e-6;

/// 二次計画問題の解
#[derive(Debug, Clone)]
pub struct QpSolution {
    pub step: Array1<f64>,
    /// 各不等式のラグランジュ乗数（≥ 0）
    pub multipliers: Array1<f64>,
}

/// 凸二次計画問題を最小距離問題に直して解く
///
/// min ½dᵀHd + gᵀd  s.t.  A·d ≤ b
///
/// H = L·Lᵀ として z = Lᵀd + L⁻¹g と置くと目的関数は ½|z|² になり、
/// その双対を非負最小二乗で解く。A の各行は行ノルムで、目的関数は
/// |L⁻¹g| ≤ 1 となるように尺度を揃えてから解く。
///
/// # 引数
/// - `hessian`: H のコレスキー分解（H は正定値）
/// - `gradient`: 一次項 g
/// - `a`: 不等式の係数行列（1行が1本の制約）
/// - `b`: 不等式の右辺
///
/// # 戻り値
/// - 解が得られれば `Some`、制約が両立しなければ `None`
pub fn solve_qp(
    hessian: &Cholesky,
    gradient: &Array1<f64>,
    a: &Array2<f64>,
    b: &Array1<f64>,
) -> Option<QpSolution> {
    let (m, n) = a.dim();
    let gl = hessian.forward(gradient.view());
    let norm = gl.dot(&gl).sqrt();
    // 目的関数を scale 倍しても解は変わらない（乗数は scale 倍になる）
    let scale = if norm > 1.0 { 1.0 / (norm * norm) } else { 1.0 };
    let rs = scale.sqrt();
    let gl = gl * rs;

    let row_norms: Array1<f64> = a
        .rows()
        .into_iter()
        .map(|r| r.dot(&r).sqrt().max(f64::MIN_POSITIVE))
        .collect();
    let mut an = a.clone();
    for (mut row, k) in an.rows_mut().into_iter().zip(row_norms.iter()) {
        row /= *k;
    }
    let bn = b / &row_norms;

    // 双対の列 E_i = [-L⁻¹a_i ; -(b_i + (L⁻¹a_i)·L⁻¹g)]
    let mut e: Array2<f64> = Array2::zeros((n + 1, m));
    for (i, row) in an.rows().into_iter().enumerate() {
        let la = hessian.forward(row) / rs;
        e.slice_mut(s![..n, i]).assign(&la.mapv(|v| -v));
        e[[n, i]] = -(bn[i] + la.dot(&gl));
    }
    let mut target: Array1<f64> = Array1::zeros(n + 1);
    target[n] = 1.0;
    let u = nnls(&e, &target);

    let residual = e.dot(&u) - &target;
    let rn = residual[n];
    if rn.abs() <= 1e-12 {
        return None;
    }

    let z = residual.slice(s![..n]).mapv(|v| -v / rn) - &gl;
    let step = hessian.backward(z.view()) / rs;
    let multipliers = (&u / &row_norms).mapv(|v| v / (-rn) / scale);

    let slack = an.dot(&step) - &bn;
    let feasible = slack
        .iter()
        .zip(bn.iter())
        .all(|(g, bound)| *g <= FEASIBILITY_ACCURACY * (1.0 + bound.abs()));
    if feasible && step.iter().all(|v| v.is_finite()) {
        Some(QpSolution { step, multipliers })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn unit_hessian() -> Cholesky {
        Cholesky::factor(&Array2::eye(2)).unwrap()
    }

    /// 制約が効かない場合は無制約解 d = -H⁻¹g を返す
    #[test]
    fn test_qp_inactive_constraints() {
        let sol = solve_qp(&unit_hessian(), &array![-1.0, -2.0], &array![[1.0, 0.0]], &array![10.0]).unwrap();
        assert_relative_eq!(sol.step[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(sol.step[1], 2.0, epsilon = 1e-12);
        assert_eq!(sol.multipliers, array![0.0]);
    }

    /// min ½|d|² - d_x - d_y, d_x + d_y ≤ 1 → d = (0.5, 0.5), λ = 0.5
    #[test]
    fn test_qp_active_constraint() {
        let sol = solve_qp(&unit_hessian(), &array![-1.0, -1.0], &array![[1.0, 1.0]], &array![1.0]).unwrap();
        assert_relative_eq!(sol.step[0], 0.5, epsilon = 1e-8);
        assert_relative_eq!(sol.step[1], 0.5, epsilon = 1e-8);
        assert_relative_eq!(sol.multipliers[0], 0.5, epsilon = 1e-8);
    }

    /// 行の大きさと勾配の大きさに解が依存しない
    #[test]
    fn test_qp_scaled_row_and_gradient() {
        let sol = solve_qp(&unit_hessian(), &array![-100.0, -100.0], &array![[10.0, 10.0]], &array![10.0]).unwrap();
        assert_relative_eq!(sol.step[0], 0.5, epsilon = 1e-8);
        assert_relative_eq!(sol.step[1], 0.5, epsilon = 1e-8);
        assert_relative_eq!(sol.multipliers[0], 9.95, epsilon = 1e-8);
    }

    /// H = [[4, 1], [1, 3]], d_x + d_y ≤ 0.1, d_x ≤ 0.05 → d = (0.04, 0.06), λ = (0.78, 0)
    #[test]
    fn test_qp_general_hessian() {
        let chol = Cholesky::factor(&array![[4.0, 1.0], [1.0, 3.0]]).unwrap();
        let a = array![[1.0, 1.0], [1.0, 0.0]];
        let sol = solve_qp(&chol, &array![-1.0, -1.0], &a, &array![0.1, 0.05]).unwrap();
        assert_relative_eq!(sol.step[0], 0.04, epsilon = 1e-10);
        assert_relative_eq!(sol.step[1], 0.06, epsilon = 1e-10);
        assert_relative_eq!(sol.multipliers[0], 0.78, epsilon = 1e-10);
        assert_relative_eq!(sol.multipliers[1], 0.0, epsilon = 1e-12);
    }

    /// d_x ≤ -1 かつ -d_x ≤ -1（d_x ≥ 1）は両立しない
    #[test]
    fn test_qp_detects_infeasible() {
        let a = array![[1.0, 0.0], [-1.0, 0.0]];
        assert!(solve_qp(&unit_hessian(), &array![0.0, 0.0], &a, &array![-1.0, -1.0]).is_none());
    }
}

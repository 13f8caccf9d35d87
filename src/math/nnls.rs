// src/math/nnls.rs

use ndarray::{s, Array1, Array2, Axis};

/// 有効集合に加える最小の勾配
const GRADIENT_TOLERANCE: f64 = 1e-12;
/// これ以下の係数は 0 とみなして有効集合から外す
const ZERO: f64 = 1e-14;

/// 最小二乗問題 min |A·x - b| を Householder QR で解く
///
/// # 引数
/// - `a`: 係数行列（行数 ≥ 列数）
/// - `b`: 右辺
///
/// # 戻り値
/// - 係数 x。列が一次従属なら `None`
pub fn least_squares(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let (rows, k) = a.dim();
    if k > rows {
        return None;
    }
    let mut r = a.clone();
    let mut rhs = b.clone();

    for j in 0..k {
        let mut v = r.slice(s![j.., j]).to_owned();
        let norm = v.dot(&v).sqrt();
        if norm == 0.0 {
            return None;
        }
        let alpha = if v[0] >= 0.0 { -norm } else { norm };
        v[0] -= alpha;
        let vv = v.dot(&v);
        if vv == 0.0 {
            continue;
        }
        for c in j..k {
            let mut col = r.slice_mut(s![j.., c]);
            let factor = 2.0 * v.dot(&col) / vv;
            col.scaled_add(-factor, &v);
        }
        let mut tail = rhs.slice_mut(s![j..]);
        let factor = 2.0 * v.dot(&tail) / vv;
        tail.scaled_add(-factor, &v);
    }

    let scale = (0..k).fold(1.0_f64, |acc, j| acc.max(r[[j, j]].abs()));
    let mut x: Array1<f64> = Array1::zeros(k);
    for j in (0..k).rev() {
        if r[[j, j]].abs() <= 1e-12 * scale {
            return None;
        }
        let sum = rhs[j] - r.slice(s![j, j + 1..k]).dot(&x.slice(s![j + 1..]));
        x[j] = sum / r[[j, j]];
    }
    Some(x)
}

/// 非負最小二乗 min |E·u - f|, u ≥ 0（Lawson–Hanson の有効集合法）
///
/// # 引数
/// - `e`: 係数行列（各列が1つの非負変数に対応する）
/// - `f`: 右辺
///
/// # 戻り値
/// - 非負の係数 u
pub fn nnls(e: &Array2<f64>, f: &Array1<f64>) -> Array1<f64> {
    let m = e.ncols();
    let mut u: Array1<f64> = Array1::zeros(m);
    let mut passive: Vec<usize> = Vec::new();
    let mut rejected = vec![false; m];

    for _ in 0..(3 * m + 10) {
        let residual = f - &e.dot(&u);
        let gradient = e.t().dot(&residual);

        let candidate = (0..m)
            .filter(|j| !passive.contains(j) && !rejected[*j])
            .map(|j| (j, gradient[j]))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        let Some((entering, g)) = candidate else {
            break;
        };
        if g <= GRADIENT_TOLERANCE {
            break;
        }
        passive.push(entering);

        loop {
            let Some(z) = least_squares(&e.select(Axis(1), &passive), f) else {
                passive.retain(|&j| j != entering);
                u[entering] = 0.0;
                rejected[entering] = true;
                break;
            };
            if z.iter().all(|v| *v > 0.0) {
                for (&j, &v) in passive.iter().zip(z.iter()) {
                    u[j] = v;
                }
                break;
            }
            // 非負のまま進める最大の割合
            let alpha = passive
                .iter()
                .zip(z.iter())
                .filter(|&(_, &v)| v <= 0.0)
                .map(|(&j, &v)| u[j] / (u[j] - v))
                .fold(f64::INFINITY, f64::min);
            for (&j, &v) in passive.iter().zip(z.iter()) {
                u[j] += alpha * (v - u[j]);
            }
            passive.retain(|&j| u[j] > ZERO);
            for j in 0..m {
                if !passive.contains(&j) {
                    u[j] = 0.0;
                }
            }
        }
    }
    u
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// y = 1 + 2t を 3 点で当てはめる
    #[test]
    fn test_least_squares_fits_line() {
        let a = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0]];
        let x = least_squares(&a, &array![1.0, 3.0, 5.0]).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_least_squares_rejects_dependent_columns() {
        let a = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        assert!(least_squares(&a, &array![1.0, 1.0, 1.0]).is_none());
    }

    /// 負の係数が必要な成分は 0 に止まる
    #[test]
    fn test_nnls_clamps_negative_component() {
        let e = array![[1.0, 0.0], [0.0, 1.0]];
        let u = nnls(&e, &array![1.0, -1.0]);
        assert_relative_eq!(u[0], 1.0, epsilon = 1e-12);
        assert_eq!(u[1], 0.0);
    }

    #[test]
    fn test_nnls_matches_unconstrained_when_positive() {
        let e = array![[2.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        // 解 (1, 2) で残差 0
        let u = nnls(&e, &array![2.0, 2.0, 3.0]);
        assert_relative_eq!(u[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(u[1], 2.0, epsilon = 1e-10);
    }
}

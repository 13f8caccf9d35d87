// src/optimization/local.rs

use log::{debug, trace};
use ndarray::{s, Array1, Array2, Axis};
use serde::Deserialize;

use crate::math::error::DomainError;
use crate::math::linalg::{norm_inf, Cholesky};
use crate::math::qp::{solve_qp, QpSolution};
use crate::optimization::space::UnitBox;
use crate::optimization::{max_violation, Bounds, ConstrainedProblem, SolverOutcome};

/// 逐次二次計画法の設定
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LocalSettings {
    pub max_iterations: usize,
    /// 探索方向の収束判定値（尺度調整後）
    pub tolerance: f64,
    /// 単位超立方体上の差分幅
    pub finite_difference_step: f64,
    /// 実行可能とみなす最大制約違反量
    pub feasibility_tolerance: f64,
    /// KKT 残差（射影ラグランジュ勾配と相補性の最大値）の収束判定値
    pub kkt_tolerance: f64,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            finite_difference_step: 1e-7,
            feasibility_tolerance: 1e-6,
            kkt_tolerance: 1e-4,
        }
    }
}

/// 線形化制約の緩和率（1 は緩和なし）
const RELAXATION: [f64; 3] = [1.0, 0.5, 0.0];
const ARMIJO: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 30;

/// 評価済みの点（目的関数・制約は尺度調整後）
#[derive(Debug, Clone)]
struct Point {
    u: Array1<f64>,
    f: f64,
    c: Array1<f64>,
    objective: f64,
    violation: f64,
}

/// 単位超立方体上で尺度を揃えた問題
struct Scaled<'a, P, const N: usize> {
    problem: &'a P,
    space: UnitBox<N>,
    objective_scale: f64,
    constraint_scale: Array1<f64>,
    evaluations: usize,
}

impl<'a, P, const N: usize> Scaled<'a, P, N>
where
    P: ConstrainedProblem<N>,
{
    fn point(&self, u: Array1<f64>, objective: f64, constraints: &[f64]) -> Point {
        Point {
            u,
            f: objective / self.objective_scale,
            c: Array1::from_iter(constraints.iter().copied()) / &self.constraint_scale,
            objective,
            violation: max_violation(constraints),
        }
    }

    fn design(&self, u: &Array1<f64>) -> [f64; N] {
        self.space.to_design(&std::array::from_fn(|i| u[i]))
    }

    fn evaluate(&mut self, u: Array1<f64>) -> Result<Point, DomainError> {
        let (f, c) = self.problem.objective_and_constraints(&self.design(&u))?;
        self.evaluations += 1;
        Ok(self.point(u, f, &c))
    }

    /// 前進差分による勾配とヤコビアン（上限に接する変数は後退差分）
    ///
    /// ヤコビアンは制約ごとに1行（m × N）
    fn gradients(&mut self, p: &Point, step: f64) -> Result<(Array1<f64>, Array2<f64>), DomainError> {
        let mut grad: Array1<f64> = Array1::zeros(N);
        let mut jac: Array2<f64> = Array2::zeros((p.c.len(), N));
        for j in 0..N {
            let h = if p.u[j] + step > 1.0 { -step } else { step };
            let mut u = p.u.clone();
            u[j] += h;
            let q = self.evaluate(u)?;
            grad[j] = (q.f - p.f) / h;
            jac.column_mut(j).assign(&((&q.c - &p.c) / h));
        }
        Ok((grad, jac))
    }
}

fn l1_violation(c: &Array1<f64>) -> f64 {
    c.iter().map(|v| (-v).max(0.0)).sum()
}

/// L1 メリット関数
fn merit(p: &Point, mu: f64) -> f64 {
    p.f + mu * l1_violation(&p.c)
}

/// 線形化制約と変数範囲の下での QP 部分問題
///
/// 両立しない場合は違反している制約を段階的に緩和する。
/// 緩和率 0 では d = 0 が常に実行可能。
fn subproblem(chol: &Cholesky, grad: &Array1<f64>, jac: &Array2<f64>, p: &Point) -> Option<QpSolution> {
    let (m, n) = jac.dim();
    // -J·d ≤ c - (1-τ)·min(c, 0), d_j ≤ 1 - u_j, -d_j ≤ u_j
    let mut a: Array2<f64> = Array2::zeros((m + 2 * n, n));
    a.slice_mut(s![..m, ..]).assign(&jac.mapv(|v| -v));
    let mut bound: Array1<f64> = Array1::zeros(m + 2 * n);
    for j in 0..n {
        a[[m + 2 * j, j]] = 1.0;
        bound[m + 2 * j] = 1.0 - p.u[j];
        a[[m + 2 * j + 1, j]] = -1.0;
        bound[m + 2 * j + 1] = p.u[j];
    }

    for tau in RELAXATION {
        bound
            .slice_mut(s![..m])
            .assign(&p.c.mapv(|c| c - (1.0 - tau) * c.min(0.0)));
        if let Some(sol) = solve_qp(chol, grad, &a, &bound) {
            if tau < 1.0 {
                debug!("線形化制約を緩和しました (τ = {})", tau);
            }
            return Some(sol);
        }
    }
    None
}

/// ∇L = ∇f - Jᵀλ
fn lagrangian_gradient(grad: &Array1<f64>, jac: &Array2<f64>, lambda: &Array1<f64>) -> Array1<f64> {
    grad - &jac.t().dot(lambda)
}

/// KKT 残差
///
/// 変数範囲に接していて外向きに押される成分を除いたラグランジュ勾配の
/// 最大値ノルムと、相補性 |λ_i·c_i| の最大値のうち大きい方。
fn kkt_residual(
    p: &Point,
    grad: &Array1<f64>,
    jac: &Array2<f64>,
    lambda: &Array1<f64>,
    bound_tolerance: f64,
) -> f64 {
    let gl = lagrangian_gradient(grad, jac, lambda);
    let stationarity = gl
        .iter()
        .zip(p.u.iter())
        .filter(|&(&g, &u)| !((u <= bound_tolerance && g > 0.0) || (u >= 1.0 - bound_tolerance && g < 0.0)))
        .fold(0.0_f64, |acc, (g, _)| acc.max(g.abs()));
    let complementarity = (lambda * &p.c).fold(0.0_f64, |acc, v| acc.max(v.abs()));
    stationarity.max(complementarity)
}

/// Powell の減衰付き BFGS 更新
///
/// # 戻り値
/// - 更新した場合は `true`
fn damped_bfgs(b: &mut Array2<f64>, s: &Array1<f64>, y: &Array1<f64>) -> bool {
    let bs = b.dot(s);
    let sbs = s.dot(&bs);
    if sbs <= 1e-16 {
        return false;
    }
    let sy = s.dot(y);
    let theta = if sy >= 0.2 * sbs {
        1.0
    } else {
        0.8 * sbs / (sbs - sy)
    };
    let r = y * theta + &bs * (1.0 - theta);
    let sr = s.dot(&r);
    if sr <= 1e-16 {
        return false;
    }
    let r_col = r.view().insert_axis(Axis(1));
    let bs_col = bs.view().insert_axis(Axis(1));
    b.scaled_add(1.0 / sr, &r_col.dot(&r_col.t()));
    b.scaled_add(-1.0 / sbs, &bs_col.dot(&bs_col.t()));
    true
}

/// 有限差分勾配による逐次二次計画法
///
/// 目的関数は初期値の絶対値で、各制約は max(1, |初期値|) で尺度を揃え、
/// 変数は単位超立方体に写して扱う。
/// 実行可能かつ KKT 残差が `kkt_tolerance` 以下になった点で収束とする。
/// KKT を満たす前に探索方向が消えた場合や直線探索が失敗した場合は
/// ヘッセ近似を単位行列に戻して続け、単位行列でも進めなければ停止する。
/// 評価中に `DomainError` が出た場合は探索を中断して返す。
pub fn minimize<P, const N: usize>(
    problem: &P,
    start: &[f64; N],
    bounds: &Bounds<N>,
    settings: &LocalSettings,
) -> Result<SolverOutcome<N>, DomainError>
where
    P: ConstrainedProblem<N>,
{
    let space = UnitBox::new(bounds);
    let start_unit = space.to_unit(start);
    let (f0, c0) = problem.objective_and_constraints(&space.to_design(&start_unit))?;
    let mut scaled = Scaled {
        problem,
        space,
        objective_scale: if f0.abs() > f64::EPSILON { f0.abs() } else { 1.0 },
        constraint_scale: c0.iter().map(|c| c.abs().max(1.0)).collect(),
        evaluations: 1,
    };
    let feasible = |p: &Point| p.violation <= settings.feasibility_tolerance;

    let mut point = scaled.point(Array1::from(start_unit.to_vec()), f0, &c0);
    let mut best = feasible(&point).then(|| point.clone());
    let (mut grad, mut jac) = scaled.gradients(&point, settings.finite_difference_step)?;
    let mut hessian: Array2<f64> = Array2::eye(N);
    // ヘッセ近似が単位行列のまま更新されていない
    let mut fresh = true;
    let mut mu = 1.0_f64;

    let mut iterations = 0;
    let mut converged = false;
    let mut message = String::from("反復回数の上限に達しました");

    while iterations < settings.max_iterations {
        iterations += 1;

        let chol = match Cholesky::factor(&hessian) {
            Some(chol) => chol,
            None => {
                hessian = Array2::eye(N);
                fresh = true;
                match Cholesky::factor(&hessian) {
                    Some(chol) => chol,
                    None => {
                        message = String::from("ヘッセ近似を分解できませんでした");
                        break;
                    }
                }
            }
        };
        let Some(qp) = subproblem(&chol, &grad, &jac, &point) else {
            message = String::from("QP 部分問題が解けませんでした");
            break;
        };
        let step = qp.step;
        let lambda = qp.multipliers.slice(s![..jac.nrows()]).to_owned();

        let kkt = kkt_residual(&point, &grad, &jac, &lambda, settings.tolerance);
        trace!("SQP 反復 {}: KKT 残差 {:.3e}", iterations, kkt);
        if feasible(&point) && kkt <= settings.kkt_tolerance {
            converged = true;
            message = String::from("KKT 条件を満たしました");
            break;
        }

        if norm_inf(&step) <= settings.tolerance {
            if !fresh {
                debug!("探索方向が消失したためヘッセ近似を初期化します (KKT 残差 {:.3e})", kkt);
                hessian = Array2::eye(N);
                fresh = true;
                continue;
            }
            message = format!("探索方向が消失しました (KKT 残差 {:.3e})", kkt);
            break;
        }

        mu = mu.max(2.0 * lambda.fold(0.0_f64, |acc, l| acc.max(*l)));

        // メリット関数の予測減少量
        let linearized = &point.c + &jac.dot(&step);
        let predicted =
            (-grad.dot(&step) + mu * (l1_violation(&point.c) - l1_violation(&linearized))).max(0.0);
        let phi = merit(&point, mu);

        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            let u = (&point.u + &(&step * alpha)).mapv(|v| v.clamp(0.0, 1.0));
            let trial = scaled.evaluate(u)?;
            trace!("直線探索 α = {:.3e}, メリット {:.9e}", alpha, merit(&trial, mu));
            if merit(&trial, mu) <= phi - ARMIJO * alpha * predicted {
                accepted = Some(trial);
                break;
            }
            alpha *= 0.5;
        }
        let Some(next) = accepted else {
            if !fresh {
                debug!("直線探索に失敗したためヘッセ近似を初期化します");
                hessian = Array2::eye(N);
                fresh = true;
                continue;
            }
            message = String::from("直線探索で改善できませんでした");
            break;
        };

        let (next_grad, next_jac) = scaled.gradients(&next, settings.finite_difference_step)?;
        let moved = &next.u - &point.u;
        let before = lagrangian_gradient(&grad, &jac, &lambda);
        let after = lagrangian_gradient(&next_grad, &next_jac, &lambda);
        if damped_bfgs(&mut hessian, &moved, &(after - before)) {
            fresh = false;
        }

        debug!(
            "SQP 反復 {}: 目的関数 {:.6}, 最大制約違反 {:.3e}, α = {:.3e}",
            iterations, next.objective, next.violation, alpha
        );

        if feasible(&next) && best.as_ref().map_or(true, |b| next.objective < b.objective) {
            best = Some(next.clone());
        }
        point = next;
        grad = next_grad;
        jac = next_jac;
    }

    let chosen = match best {
        Some(b) if !converged => b,
        _ => point,
    };
    Ok(SolverOutcome {
        x: scaled.design(&chosen.u),
        objective: chosen.objective,
        max_violation: chosen.violation,
        iterations,
        evaluations: scaled.evaluations,
        converged,
        message,
    })
}

// src/optimization/global.rs

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::optimization::space::UnitBox;
use crate::optimization::{max_violation, Bounds, ConstrainedProblem, SolverOutcome};

/// 差分進化の設定
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GlobalSettings {
    pub max_generations: usize,
    /// 母集団サイズ = population_factor × 変数の数
    pub population_factor: usize,
    /// 世代ごとに一様に選ぶ差分重み F の区間 [下限, 上限)
    pub mutation: (f64, f64),
    pub crossover: f64,
    /// 収束判定: std(E) ≤ absolute_tolerance + tolerance·|mean(E)|
    pub tolerance: f64,
    pub absolute_tolerance: f64,
    /// 未指定ならエントロピーから初期化する
    pub seed: Option<u64>,
    /// 終了後に最良点から局所探索で仕上げる
    pub polish: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            max_generations: 1000,
            population_factor: 15,
            mutation: (0.5, 1.0),
            crossover: 0.7,
            tolerance: 0.01,
            absolute_tolerance: 0.0,
            seed: None,
            polish: true,
        }
    }
}

const LOG_INTERVAL: usize = 50;

/// 罰則付き目的関数の値。評価できない点は +∞。
fn energy<P, const N: usize>(problem: &P, space: &UnitBox<N>, u: &[f64; N]) -> f64
where
    P: ConstrainedProblem<N>,
{
    match problem.penalized_objective(&space.to_design(u)) {
        Ok(v) if v.is_finite() => v,
        Ok(v) => {
            trace!("非有限の評価値 {} を +∞ として扱います", v);
            f64::INFINITY
        }
        Err(e) => {
            trace!("評価できない点を +∞ として扱います: {}", e);
            f64::INFINITY
        }
    }
}

/// ラテン超方格で単位超立方体に母集団を配置する
fn latin_hypercube<const N: usize>(size: usize, rng: &mut StdRng) -> Vec<[f64; N]> {
    let mut population = vec![[0.0; N]; size];
    let mut segments: Vec<usize> = (0..size).collect();
    for j in 0..N {
        segments.shuffle(rng);
        for (member, segment) in population.iter_mut().zip(segments.iter()) {
            member[j] = (*segment as f64 + rng.gen::<f64>()) / size as f64;
        }
    }
    population
}

fn pick_other(size: usize, exclude: &[usize], rng: &mut StdRng) -> usize {
    loop {
        let r = rng.gen_range(0..size);
        if !exclude.contains(&r) {
            return r;
        }
    }
}

fn spread(energies: &[f64]) -> (f64, f64) {
    let n = energies.len() as f64;
    let mean = energies.iter().sum::<f64>() / n;
    let var = energies.iter().map(|e| (e - mean) * (e - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// 罰則付き目的関数に対する差分進化（best/1/bin、即時置換）
///
/// # 引数
/// - `problem`: 評価する問題
/// - `initial`: 指定された場合は母集団の1個体をこの点に置き換える
/// - `bounds`: 探索範囲
/// - `settings`: 差分進化の設定
///
/// # 戻り値
/// - 最良個体。評価エラーは探索を止めずに +∞ として扱う
pub fn minimize<P, const N: usize>(
    problem: &P,
    initial: Option<&[f64; N]>,
    bounds: &Bounds<N>,
    settings: &GlobalSettings,
) -> SolverOutcome<N>
where
    P: ConstrainedProblem<N>,
{
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let space = UnitBox::new(bounds);
    let size = (settings.population_factor * N).max(5);

    let mut population = latin_hypercube::<N>(size, &mut rng);
    if let Some(x0) = initial {
        population[0] = space.to_unit(x0);
    }
    let mut energies: Vec<f64> = population.iter().map(|u| energy(problem, &space, u)).collect();
    let mut evaluations = size;
    let mut best = argmin(&energies);

    let (f_lo, f_hi) = settings.mutation;
    let mut generations = 0;
    let mut converged = false;

    while generations < settings.max_generations {
        generations += 1;
        let scale = if f_lo < f_hi { rng.gen_range(f_lo..f_hi) } else { f_lo };

        for i in 0..size {
            let r1 = pick_other(size, &[i], &mut rng);
            let r2 = pick_other(size, &[i, r1], &mut rng);
            let forced = rng.gen_range(0..N);

            let mut trial = population[i];
            for j in 0..N {
                if j == forced || rng.gen::<f64>() < settings.crossover {
                    trial[j] = population[best][j] + scale * (population[r1][j] - population[r2][j]);
                }
            }
            for v in trial.iter_mut() {
                if !(0.0..=1.0).contains(v) {
                    *v = rng.gen::<f64>();
                }
            }

            let e = energy(problem, &space, &trial);
            evaluations += 1;
            if e <= energies[i] {
                population[i] = trial;
                energies[i] = e;
                if e < energies[best] {
                    best = i;
                }
            }
        }

        if generations % LOG_INTERVAL == 0 {
            debug!("差分進化 第 {} 世代: 最良値 {:.6}", generations, energies[best]);
        }

        if energies.iter().all(|e| e.is_finite()) {
            let (mean, std) = spread(&energies);
            if std <= settings.absolute_tolerance + settings.tolerance * mean.abs() {
                converged = true;
                break;
            }
        }
    }

    let x = space.to_design(&population[best]);
    let (objective, violation) = match problem.objective_and_constraints(&x) {
        Ok((f, c)) => (f, max_violation(&c)),
        Err(_) => (energies[best], f64::INFINITY),
    };
    evaluations += 1;

    SolverOutcome {
        x,
        objective,
        max_violation: violation,
        iterations: generations,
        evaluations,
        converged,
        message: if converged {
            String::from("母集団のばらつきが許容値以下になりました")
        } else {
            String::from("世代数の上限に達しました")
        },
    }
}

fn argmin(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(bi, bv), (i, &v)| if v < bv { (i, v) } else { (bi, bv) })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::error::DomainError;
    use approx::assert_relative_eq;

    /// Σ(x_i - 0.3)²
    struct Bowl;

    impl ConstrainedProblem<3> for Bowl {
        fn objective(&self, x: &[f64; 3]) -> Result<f64, DomainError> {
            Ok(x.iter().map(|v| (v - 0.3) * (v - 0.3)).sum())
        }

        fn constraints(&self, _x: &[f64; 3]) -> Result<Vec<f64>, DomainError> {
            Ok(Vec::new())
        }

        fn penalized_objective(&self, x: &[f64; 3]) -> Result<f64, DomainError> {
            self.objective(x)
        }
    }

    /// x_0 < 0 では評価できない x_0² + x_1²
    struct HalfPlane;

    impl ConstrainedProblem<2> for HalfPlane {
        fn objective(&self, x: &[f64; 2]) -> Result<f64, DomainError> {
            if x[0] < 0.0 {
                return Err(DomainError::NegativeRoot {
                    quantity: "half_plane",
                    value: x[0],
                });
            }
            Ok(x[0] * x[0] + x[1] * x[1])
        }

        fn constraints(&self, _x: &[f64; 2]) -> Result<Vec<f64>, DomainError> {
            Ok(Vec::new())
        }

        fn penalized_objective(&self, x: &[f64; 2]) -> Result<f64, DomainError> {
            self.objective(x)
        }
    }

    fn settings(seed: u64) -> GlobalSettings {
        GlobalSettings {
            seed: Some(seed),
            tolerance: 0.0,
            absolute_tolerance: 1e-10,
            ..GlobalSettings::default()
        }
    }

    #[test]
    fn test_de_finds_bowl_minimum() {
        let out = minimize(&Bowl, None, &[(-1.0, 1.0); 3], &settings(7));
        for v in out.x {
            assert_relative_eq!(v, 0.3, epsilon = 1e-3);
        }
        assert!(out.objective < 1e-5);
        assert_eq!(out.max_violation, 0.0);
    }

    #[test]
    fn test_de_is_reproducible_with_seed() {
        let a = minimize(&Bowl, None, &[(-1.0, 1.0); 3], &settings(11));
        let b = minimize(&Bowl, None, &[(-1.0, 1.0); 3], &settings(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_de_skips_unevaluable_points() {
        let out = minimize(&HalfPlane, None, &[(-1.0, 1.0), (-1.0, 1.0)], &settings(5));
        assert!(out.x[0] >= 0.0);
        assert!(out.objective < 1e-4, "objective {}", out.objective);
    }

    #[test]
    fn test_initial_vector_joins_population() {
        let s = GlobalSettings {
            max_generations: 0,
            ..settings(1)
        };
        let out = minimize(&Bowl, Some(&[0.3, 0.3, 0.3]), &[(-1.0, 1.0); 3], &s);
        for v in out.x {
            assert_relative_eq!(v, 0.3, epsilon = 1e-12);
        }
        assert_eq!(out.iterations, 0);
        assert!(!out.converged);
    }

    #[test]
    fn test_latin_hypercube_covers_every_stratum() {
        let mut rng = StdRng::seed_from_u64(0);
        let pop = latin_hypercube::<2>(10, &mut rng);
        for j in 0..2 {
            let mut strata: Vec<usize> = pop.iter().map(|m| (m[j] * 10.0) as usize).collect();
            strata.sort_unstable();
            assert_eq!(strata, (0..10).collect::<Vec<_>>());
        }
    }
}

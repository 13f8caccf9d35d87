// src/sizing/design.rs

use serde::Deserialize;

/// 設計変数の数
pub const DESIGN_DIM: usize = 8;

/// 設計変数の探索範囲（閉区間）
pub const DESIGN_BOUNDS: [(f64, f64); DESIGN_DIM] = [
    (0.3, 0.6),   // beta
    (1.0, 400.0), // k_m
    (1.0, 100.0), // k_nd
    (1.0, 100.0), // k_mot
    (1.0, 400.0), // k_speed_mot
    (0.1, 100.0), // k_mb
    (1.0, 5.0),   // k_vb
    (0.1, 0.99),  // k_d
];

/// レポート・ログ用の設計変数名
pub const DESIGN_LABELS: [&str; DESIGN_DIM] = [
    "beta",
    "k_m",
    "k_nd",
    "k_mot",
    "k_speed_mot",
    "k_mb",
    "k_vb",
    "k_d",
];

/// 設計ベクトル（全て無次元の比または係数）
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct DesignVector {
    pub beta: f64,        // ピッチ/直径比
    pub k_m: f64,         // 総質量の過大評価係数
    pub k_nd: f64,        // プロペラ回転数の減速係数
    pub k_mot: f64,       // モータトルクの過大評価係数
    pub k_speed_mot: f64, // モータ回転数の過大評価係数
    pub k_mb: f64,        // バッテリ質量 / ペイロード質量
    pub k_vb: f64,        // バッテリ電圧の過大評価係数
    pub k_d: f64,         // アーム内径 / 外径
}

impl DesignVector {
    pub fn from_array(x: [f64; DESIGN_DIM]) -> Self {
        Self {
            beta: x[0],
            k_m: x[1],
            k_nd: x[2],
            k_mot: x[3],
            k_speed_mot: x[4],
            k_mb: x[5],
            k_vb: x[6],
            k_d: x[7],
        }
    }

    pub fn to_array(&self) -> [f64; DESIGN_DIM] {
        [
            self.beta,
            self.k_m,
            self.k_nd,
            self.k_mot,
            self.k_speed_mot,
            self.k_mb,
            self.k_vb,
            self.k_d,
        ]
    }

    /// 範囲外の成分の一覧（インデックス, 値）
    pub fn out_of_bounds(&self, bounds: &[(f64, f64); DESIGN_DIM]) -> Vec<(usize, f64)> {
        self.to_array()
            .iter()
            .zip(bounds.iter())
            .enumerate()
            .filter(|(_, (x, (lo, hi)))| **x < *lo || **x > *hi)
            .map(|(i, (x, _))| (i, *x))
            .collect()
    }
}

impl From<[f64; DESIGN_DIM]> for DesignVector {
    fn from(x: [f64; DESIGN_DIM]) -> Self {
        Self::from_array(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_conversion_keeps_order() {
        let x = [0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.5];
        let design = DesignVector::from_array(x);
        assert_eq!(design.k_m, 3.2);
        assert_eq!(design.k_d, 0.5);
        assert_eq!(design.to_array(), x);
    }

    #[test]
    fn test_out_of_bounds_reports_index() {
        let design = DesignVector::from_array([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01]);
        assert_eq!(design.out_of_bounds(&DESIGN_BOUNDS), vec![(7, 0.01)]);
    }
}

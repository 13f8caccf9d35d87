// src/math/error.rs

use thiserror::Error;

/// 物理的に意味をなさない中間値が現れたときのエラー
///
/// 1回の評価はここで打ち切られる。最適化ドライバはこれを「実行不能点」として扱う。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("{quantity} の平方根/べき乗の底が負です（値: {value}）")]
    NegativeRoot { quantity: &'static str, value: f64 },

    #[error("{quantity} の計算でゼロ除算が発生しました")]
    DivisionByZero { quantity: &'static str },

    #[error("{quantity} が有限値ではありません（値: {value}）")]
    NonFinite { quantity: &'static str, value: f64 },

    #[error("{quantity} が下限 {minimum} を下回りました（値: {value}）")]
    BelowMinimum {
        quantity: &'static str,
        value: f64,
        minimum: f64,
    },
}

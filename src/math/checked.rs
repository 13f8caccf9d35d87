// src/math/checked.rs

use crate::math::error::DomainError;

/// 有限値であることを確認して値をそのまま返す
pub fn finite(quantity: &'static str, value: f64) -> Result<f64, DomainError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::NonFinite { quantity, value })
    }
}

/// 負の引数を拒否する平方根
pub fn sqrt(quantity: &'static str, value: f64) -> Result<f64, DomainError> {
    if value < 0.0 {
        return Err(DomainError::NegativeRoot { quantity, value });
    }
    finite(quantity, value.sqrt())
}

/// 分母がゼロ（または非有限）の除算を拒否する
///
/// # 引数
/// - `quantity`: エラーメッセージに使う物理量の名前
/// - `numerator`: 分子
/// - `denominator`: 分母
///
/// # 戻り値
/// - 商（有限値のみ）
pub fn div(quantity: &'static str, numerator: f64, denominator: f64) -> Result<f64, DomainError> {
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(DomainError::DivisionByZero { quantity });
    }
    finite(quantity, numerator / denominator)
}

/// 底が負になる実数べき乗を拒否する
pub fn powf(quantity: &'static str, base: f64, exponent: f64) -> Result<f64, DomainError> {
    if base < 0.0 {
        return Err(DomainError::NegativeRoot { quantity, value: base });
    }
    if base == 0.0 && exponent < 0.0 {
        return Err(DomainError::DivisionByZero { quantity });
    }
    finite(quantity, base.powf(exponent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqrt_rejects_negative() {
        let result = sqrt("diameter", -1.0);
        match result {
            Err(DomainError::NegativeRoot { quantity, value }) => {
                assert_eq!(quantity, "diameter");
                assert_eq!(value, -1.0);
            }
            _ => panic!("Expected DomainError::NegativeRoot"),
        }
    }

    #[test]
    fn test_div_rejects_zero_denominator() {
        assert!(matches!(
            div("current", 1.0, 0.0),
            Err(DomainError::DivisionByZero { quantity: "current" })
        ));
        assert!(div("current", 1.0, f64::NAN).is_err());
        assert_eq!(div("current", 6.0, 3.0).unwrap(), 2.0);
    }

    #[test]
    fn test_powf_zero_base_negative_exponent() {
        assert!(powf("resistance", 0.0, -1.0).is_err());
        assert_eq!(powf("resistance", 0.0, 2.0).unwrap(), 0.0);
        assert!((powf("mass", 8.0, 1.0 / 3.0).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_finite_rejects_infinity() {
        assert!(finite("energy", f64::INFINITY).is_err());
        assert!(finite("energy", f64::NAN).is_err());
    }
}

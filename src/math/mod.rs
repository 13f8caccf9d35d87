// src/math/mod.rs

pub mod checked;
pub mod error;
pub mod linalg;
pub mod nnls;
pub mod qp;

pub use error::DomainError;
pub use linalg::Cholesky;
pub use qp::{solve_qp, QpSolution};

// src/models/mod.rs

pub mod battery;
pub mod esc;
pub mod frame;
pub mod motor;
pub mod propeller;

pub use battery::BatterySizing;
pub use esc::EscSizing;
pub use frame::FrameSizing;
pub use motor::{MotorOperatingPoint, MotorSizing};
pub use propeller::{PropellerOperatingPoint, PropellerSizing};

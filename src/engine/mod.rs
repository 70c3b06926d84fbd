//! Data processing engine.
//!
//! | Piece | Role |
//! |---|---|
//! | **Field** | [`DataField`]: samples plus physical size and units |
//! | **Units** | [`SiUnit`] parsing and [`ValueFormat`] rendering |
//! | **Parameters** | [`Settings`] / [`PolyLevelParams`]: what a function should do |
//! | **Calculations** | Pure numeric routines (plane fit, Legendre fit, box filter) |
//! | **Backend** | [`ProcessingEngine`] trait + [`NativeEngine`] |

pub mod backend;
mod calculations;
pub mod field;
pub mod native;
pub mod params;
pub mod units;

pub use backend::{EngineError, ProcessingEngine};
pub use field::DataField;
pub use native::NativeEngine;
pub use params::{MAX_POLY_DEGREE, Masking, PolyLevelParams, Settings};
pub use units::{SiUnit, ValueFormat};

//! Data types shared by the loader, reconciler, scaler and renderer.

mod cell;
mod matrix;
mod scale;
mod table;

pub use cell::*;
pub use matrix::*;
pub use scale::*;
pub use table::*;

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod ecosystem;
pub mod fixed_point;
pub mod prices;
pub mod traits;
pub mod weighted_math;

pub use ecosystem::*;
pub use fixed_point::Uq112x112;
pub use prices::{ObservationWindow, PriceObservation, TwoWayAveragePrice};

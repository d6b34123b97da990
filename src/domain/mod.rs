pub mod asset;
pub mod booking;
pub mod commands;
pub mod errors;
pub mod events;
pub mod overlap;
pub mod pricing;
pub mod value_objects;

pub use asset::*;
pub use booking::{Booking, BookingStatus, Settlement, SettlementTerms, Transition};
pub use errors::*;
pub use events::*;
pub use pricing::SettlementAdjustment;
pub use value_objects::*;

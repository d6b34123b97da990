mod booking_service;
mod errors;
mod reporting;

pub use booking_service::{
    BookingSettings, DEFAULT_STORE_TIMEOUT, ServiceDependencies, cancel_booking, create_booking,
    has_conflict, resolve_caller, update_booking_dates, update_status,
};
pub use errors::{BookingApplicationError, Result};
pub use reporting::{
    BookingStats, booking_history, booking_stats, get_booking, list_all_bookings,
    list_my_bookings,
};

pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod users;

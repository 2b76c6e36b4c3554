pub mod auth_guard;
pub mod booking_code;
pub mod google;
pub mod hashing;
pub mod jwt;
pub mod rate_limit;
pub mod security;

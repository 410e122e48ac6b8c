pub mod api;
pub mod attendees;
pub mod error;
pub mod health;
pub mod meetings;

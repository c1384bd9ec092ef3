pub mod booking;
pub mod driver;
pub mod hospital;
pub mod user;

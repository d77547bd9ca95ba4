pub mod chart;
pub mod payment;
pub mod user;

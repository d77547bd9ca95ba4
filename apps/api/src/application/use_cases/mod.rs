pub mod chart;
pub mod subscription;
pub mod user;

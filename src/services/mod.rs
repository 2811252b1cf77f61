pub mod arrival;
pub mod distance;
pub mod multi_destination;
pub mod route_optimizer;
pub mod session;

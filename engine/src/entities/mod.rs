pub mod aircraft;
pub mod airline;
pub mod airport;
pub mod conflict;
pub mod model;

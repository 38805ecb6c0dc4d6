pub mod incident_status;
pub mod province;

pub use incident_status::IncidentStatus;
pub use province::Province;

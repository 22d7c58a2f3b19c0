pub mod applications;
pub mod business_case;
pub mod functions;
pub mod probes;

pub mod applications;
pub mod business_cases;
pub mod jobs;
pub mod responses;

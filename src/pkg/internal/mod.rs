pub mod access;
pub mod adaptors;
pub mod ai;
pub mod business_case;
pub mod email;
pub mod minio;
pub mod recorder;
pub mod session;
pub mod store;

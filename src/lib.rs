//! Local image hosting: uploads go through an optional JPEG re-encode, land
//! in a shared upload directory under generated names, and come back as URLs
//! served by the companion static file server binary.

pub mod config;
pub mod errors;
pub mod storage;

//! Command implementations

pub mod bronze;
pub mod common;
pub mod ddl;
pub mod transform;
pub mod verify;

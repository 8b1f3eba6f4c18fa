//! shared types, errors and settings of the insta backend
pub mod constants;
pub mod data_structures;
pub mod env;
pub mod error_code;
pub mod hash;
pub mod log;
pub mod utils;

#[macro_use]
extern crate lazy_static;

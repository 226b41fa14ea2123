#![forbid(unsafe_code)]

pub mod model;
pub mod resolve;
pub mod store;
pub mod view;

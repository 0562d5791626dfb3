pub mod cache;
pub mod controller;
pub mod interpolation;
pub mod model;
pub mod service;

// src/models/mod.rs

pub mod assignment;
pub mod classroom;
pub mod submission;
pub mod user;

//! Utility functions for the application

pub mod file;
pub mod number;
pub mod string;
pub mod time;

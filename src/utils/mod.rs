pub mod data;
pub mod formatter;
pub mod grading;
pub mod markets;

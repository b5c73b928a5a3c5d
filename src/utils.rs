//! Utility modules for the InstaScheduler application

pub mod datetime;

//! Request and response bodies

pub mod guest;

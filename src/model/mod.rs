//! Data shared between the core and its observers

pub mod event;

//! Low-level primitives and utilities

pub mod path_utils;

//! rollcall_engine - A1 ranges, reaction priorities and name lookup.

pub mod engine;

//! End-to-end runs of the whole benchmark against the shipped backends.

#[path = "../common/mod.rs"]
mod common;

mod artifacts;
mod full_run;
mod persistence;

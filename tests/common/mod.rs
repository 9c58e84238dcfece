#![allow(dead_code)]

pub mod harness;
pub mod strategies;

pub use harness::*;

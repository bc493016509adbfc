pub mod config;
pub mod controller;
#[cfg(test)]
pub mod controller_test;
pub mod drivers;
pub mod messages;
pub mod schedule;

pub mod control;
pub mod device;
#[cfg(test)]
pub mod device_test;
pub mod driver;
#[cfg(test)]
pub mod driver_test;
pub mod hid_report;

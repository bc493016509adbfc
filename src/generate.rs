use std::fs::{self, File};
use std::io::Write;

use ds4_driver::config::DriverConfig;
use schemars::schema_for;

fn main() {
    let driver_config_schema = schema_for!(DriverConfig);
    fs::create_dir_all("./rootfs/usr/share/ds4driver/schema")
        .expect("Failed to create schema directory");
    let mut file = File::create("./rootfs/usr/share/ds4driver/schema/driver_v1.json")
        .expect("Failed to create schema file");
    write!(
        file,
        "{}",
        serde_json::to_string_pretty(&driver_config_schema).unwrap()
    )
    .expect("Failed to write schema");
}

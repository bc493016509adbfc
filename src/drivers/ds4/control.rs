/// Saturate the given value into the 0-255 range of a report byte
pub fn saturate(value: u32) -> u8 {
    value.min(u8::MAX as u32) as u8
}

/// Output state of the controller: light bar color, light bar flash timing
/// and rumble motor intensities. Flash durations are in units of ~9.8ms,
/// where 255 is 2.5 seconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ControlState {
    pub led_red: u8,
    pub led_green: u8,
    pub led_blue: u8,
    pub flash_on: u8,
    pub flash_off: u8,
    pub rumble_small: u8,
    pub rumble_big: u8,
    pub flashing: bool,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the light bar color. Values above 255 are saturated.
    pub fn set_led(&mut self, red: u32, green: u32, blue: u32) {
        self.led_red = saturate(red);
        self.led_green = saturate(green);
        self.led_blue = saturate(blue);
    }

    /// Set the rumble motor intensities. Values above 255 are saturated.
    pub fn set_rumble(&mut self, small: u32, big: u32) {
        self.rumble_small = saturate(small);
        self.rumble_big = saturate(big);
    }

    /// Set the flash durations directly. A non-zero duration marks the light
    /// bar as flashing.
    pub fn set_flash(&mut self, on: u32, off: u32) {
        self.flash_on = saturate(on);
        self.flash_off = saturate(off);
        self.flashing = self.flash_on != 0 || self.flash_off != 0;
    }

    /// Start flashing the light bar. Returns false without changing anything
    /// if the light bar is already flashing.
    pub fn start_flash(&mut self, on: u32, off: u32) -> bool {
        if self.flashing {
            return false;
        }
        self.flash_on = saturate(on);
        self.flash_off = saturate(off);
        self.flashing = true;
        true
    }

    /// Stop flashing the light bar. Returns false if it was not flashing.
    pub fn stop_flash(&mut self) -> bool {
        if !self.flashing {
            return false;
        }
        self.flash_on = 0;
        self.flash_off = 0;
        self.flashing = false;
        true
    }
}

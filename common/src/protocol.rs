pub const REQUEST_BUFFER_BYTES: usize = 1024;
pub const COMMAND_OFFSET: usize = 5;

pub const TRIP_EVENT_TOKEN: &str = "tripped";
pub const MAX_SERIAL_LINE_BYTES: usize = 1000;

pub const REPLY_NO_DATA: &str = "No data available.";
pub const REPLY_DEVICE_ERROR: &str = "Device error!";
pub const REPLY_MESSAGE_SENT: &str = "Message Sent";
pub const REPLY_ALARM_RESET: &str = "Alarm Reset";
pub const REPLY_STANDBY_ENGAGED: &str = "Standby engaged.";
pub const REPLY_STANDBY_DISENGAGED: &str = "Standby disengaged.";
pub const REPLY_TRIPPED: &str = "tripped";
pub const REPLY_NOT_TRIPPED: &str = "nottripped";

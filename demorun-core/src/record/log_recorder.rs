use super::{Record, Recorder};
use log::Level;

/// Forwards records to the `log` facade as JSON lines.
pub struct LogRecorder {
    target: String,
    level: Level,
}

impl LogRecorder {
    /// Records are logged with the given target at the given level.
    pub fn new(target: impl Into<String>, level: Level) -> Self {
        Self {
            target: target.into(),
            level,
        }
    }
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self::new("demorun::record", Level::Debug)
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        if log::log_enabled!(target: self.target.as_str(), self.level) {
            log::log!(target: self.target.as_str(), self.level, "{}", record.to_json());
        }
    }
}

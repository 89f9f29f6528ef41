use super::{Record, Recorder};

/// Buffered recorder.
///
/// This is used for keeping the per-step records of an episode in memory,
/// for example to export a trajectory or to inspect it in tests.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.buf.iter()
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Takes the records out of the buffer.
    pub fn take(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.buf)
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordValue;

    #[test]
    fn test_iter_and_take() {
        let mut recorder = BufferedRecorder::new();
        recorder.write(Record::from_scalar("reward", 1.0));
        recorder.write(Record::from_slice(&[
            ("reward", RecordValue::Scalar(0.5)),
            ("done", RecordValue::Bool(true)),
        ]));

        let n_keys: Vec<usize> = recorder.iter().map(|r| r.keys().count()).collect();
        assert_eq!(n_keys, vec![1, 2]);
        assert_eq!(recorder.take().len(), 2);
        assert!(recorder.is_empty());
    }
}

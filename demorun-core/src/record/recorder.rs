use super::Record;

/// Writes a record to an output destination with [`Recorder::write`].
pub trait Recorder {
    /// Write a record to the [`Recorder`].
    fn write(&mut self, record: Record);
}

impl<R: Recorder + ?Sized> Recorder for &mut R {
    fn write(&mut self, record: Record) {
        (**self).write(record)
    }
}

/// A recorder which stores records and writes values aggregated over them.
pub trait AggregateRecorder {
    /// Store the record.
    fn store(&mut self, record: Record);

    /// Returns values aggregated from the stored records and clears them.
    fn flush(&mut self) -> Record;
}

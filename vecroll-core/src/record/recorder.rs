use super::Record;

/// Writes a record to some destination.
pub trait Recorder {
    /// Write a record.
    fn write(&mut self, record: Record);
}

/// A recorder that ignores any record.
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn write(&mut self, _record: Record) {}
}

/// A recorder that keeps records in memory.
#[derive(Default)]
pub struct BufferedRecorder(Vec<Record>);

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns an iterator over the stored records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.0.iter()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no record has been written.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) {
        self.0.push(record);
    }
}

//! Per-key aggregates and the tables that hold them.

use std::fmt;

use ahash::AHashMap;

/// Accumulated statistics for one key.
///
/// An empty record carries the sentinels `-inf`/`+inf` for its maximum and
/// minimum, so that the first `process` or `merge` always replaces them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    count: u64,
    total: f64,
    maximum: f64,
    minimum: f64,
}

impl Record {
    pub fn new() -> Self {
        Self {
            count: 0,
            total: 0.0,
            maximum: f64::NEG_INFINITY,
            minimum: f64::INFINITY,
        }
    }

    pub fn process(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.maximum = self.maximum.max(value);
        self.minimum = self.minimum.min(value);
    }

    pub fn merge(&mut self, other: &Record) {
        self.count += other.count;
        self.total += other.total;
        self.maximum = self.maximum.max(other.maximum);
        self.minimum = self.minimum.min(other.minimum);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Arithmetic mean of every processed value.
    ///
    /// # Panics
    /// Panics if the record is empty.
    pub fn mean(&self) -> f64 {
        assert!(self.count > 0, "mean requested for an empty record");
        self.total / self.count as f64
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// `minimum/mean/maximum`, one fractional digit each.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tenths(f, self.minimum)?;
        f.write_str("/")?;
        write_tenths(f, self.mean())?;
        f.write_str("/")?;
        write_tenths(f, self.maximum)
    }
}

/// Writes `value` rounded half-up to one fractional digit.
///
/// Rounding happens on the scaled integer so that ties resolve towards
/// positive infinity and a value rounding to zero never prints as `-0.0`.
fn write_tenths(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    let tenths = (value * 10.0 + 0.5).floor() as i64;
    let sign = if tenths < 0 { "-" } else { "" };
    let abs = tenths.unsigned_abs();
    write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
}

/// Mapping from key bytes to their aggregate.
///
/// Keys are compared byte for byte and never validated as UTF-8.
#[derive(Debug, Default, Clone)]
pub struct RecordTable {
    records: AHashMap<Box<[u8]>, Record>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one measurement into the record for `key`, creating it on first sight.
    pub fn process(&mut self, key: &[u8], value: f64) {
        match self.records.get_mut(key) {
            Some(record) => record.process(value),
            None => {
                let mut record = Record::new();
                record.process(value);
                self.records.insert(key.into(), record);
            }
        }
    }

    /// Merge a single record under `key`.
    pub fn merge(&mut self, key: Box<[u8]>, record: Record) {
        self.records
            .entry(key)
            .and_modify(|existing| existing.merge(&record))
            .or_insert(record);
    }

    /// Consume another table, folding each of its records into this one.
    pub fn merge_table(&mut self, other: RecordTable) {
        for (key, record) in other.records {
            self.merge(key, record);
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&Record> {
        self.records.get(key)
    }

    /// Total number of measurements folded into the table.
    pub fn measurements(&self) -> u64 {
        self.records.values().map(Record::count).sum()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Entries in ascending byte order of their keys.
    pub fn into_sorted(self) -> Vec<(Box<[u8]>, Record)> {
        let mut entries: Vec<_> = self.records.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Render the whole table as `{k1=min/mean/max, k2=...}`.
    ///
    /// Key bytes are copied through untouched.
    pub fn render(self) -> Vec<u8> {
        let entries = self.into_sorted();
        let mut out = Vec::with_capacity(entries.len() * 32 + 2);
        out.push(b'{');
        for (i, (key, record)) in entries.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(b", ");
            }
            out.extend_from_slice(key);
            out.push(b'=');
            out.extend_from_slice(record.to_string().as_bytes());
        }
        out.push(b'}');
        out
    }
}

//! Handler trait: the single capability all delivery targets share
//!
//! A handler accepts one record and eventually hands it to its delivery
//! target. Decorator handlers (async, buffered, JSON) own a boxed wrapped
//! handler and compose around this trait instead of inheriting behavior.

use super::error::Result;
use super::record::Record;

pub trait Handler: Send {
    /// Deliver one record
    fn emit(&mut self, record: &Record) -> Result<()>;

    /// Deliver a batch of records in order.
    ///
    /// Handlers that can deliver a batch more efficiently override this;
    /// the default is a tight sequential series of individual deliveries.
    /// All records are attempted; the first error is returned.
    fn emit_batch(&mut self, records: &[Record]) -> Result<()> {
        let mut first_err = None;
        for record in records {
            if let Err(e) = self.emit(record) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Flush pending output to the delivery target
    fn flush(&mut self) -> Result<()>;

    /// Flush and release resources; no records are accepted afterwards
    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str;
}

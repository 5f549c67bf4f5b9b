//! Upload progress reporting.

/// Callback invoked as request body bytes are written.
///
/// `uploaded` is the running total of transferred units and `total` the expected final
/// count, when the request knows it. Text bodies report character counts and never
/// carry a total.
pub trait UploadProgress: Send {
    /// Reports that the running total has advanced to `uploaded` out of `total`.
    fn on_upload(&mut self, uploaded: u64, total: Option<u64>);
}

impl<F> UploadProgress for F
where
    F: FnMut(u64, Option<u64>) + Send,
{
    fn on_upload(&mut self, uploaded: u64, total: Option<u64>) {
        self(uploaded, total)
    }
}

/// The progress callback that discards every report.
///
/// Every request starts with this callback, and reverts to it when the output channel
/// closes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl UploadProgress for NoopProgress {
    fn on_upload(&mut self, _uploaded: u64, _total: Option<u64>) {}
}

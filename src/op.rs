//! Completion handling for operations that hold an open resource.
//!
//! Every body copy runs inside one of the helpers here, so the resource it holds is
//! flushed or released exactly once and exactly one error surfaces. When both the
//! operation and the completion step fail, the operation's error wins and the
//! completion error is dropped.

use std::io;

use crate::error::{Error, Result};
use crate::sink::BodySink;

/// A resource with a completion step.
///
/// Which of the two steps can actually fail is fixed by the implementing type, not
/// discovered at completion time: read sources have nothing to flush and close by
/// drop, writers flush for real.
pub(crate) trait CloseResource {
    /// Pushes buffered data down. Failures always surface.
    fn flush(&mut self) -> io::Result<()>;

    /// Releases the resource. Failures surface only when close errors are not ignored.
    fn close(&mut self) -> io::Result<()>;
}

/// A body source. Rust readers release on drop, so both steps are no-ops.
pub(crate) struct ReadSource<R>(pub(crate) R);

impl<R: io::Read> CloseResource for ReadSource<R> {
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A destination writer owned by the operation. Flushes for real, releases on drop.
pub(crate) struct WriteSink<W>(pub(crate) W);

impl<W: io::Write> CloseResource for WriteSink<W> {
    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CloseResource for BodySink {
    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(self)
    }

    fn close(&mut self) -> io::Result<()> {
        self.finish()
    }
}

/// Resolves the operation result against the completion result.
///
/// The operation error is primary: it surfaces even when the completion step also
/// failed. A completion error surfaces only when the operation itself succeeded.
pub(crate) fn resolve<T>(primary: Result<T>, completion: Result<()>) -> Result<T> {
    match primary {
        Ok(value) => completion.map(|()| value),
        Err(err) => Err(err),
    }
}

/// Runs `run` and then completes `resource`: flush first, close second.
///
/// Flush failures always count as completion failures. Close failures count only when
/// `ignore_close_errors` is false.
pub(crate) fn closing<R, T>(
    resource: &mut R,
    ignore_close_errors: bool,
    run: impl FnOnce(&mut R) -> Result<T>,
) -> Result<T>
where
    R: CloseResource + ?Sized,
{
    let primary = run(resource);
    let completion = complete(resource, ignore_close_errors);
    resolve(primary, completion)
}

/// Runs `run` and then flushes `resource`, leaving it open.
pub(crate) fn flushing<R, T>(resource: &mut R, run: impl FnOnce(&mut R) -> Result<T>) -> Result<T>
where
    R: CloseResource + ?Sized,
{
    let primary = run(resource);
    let completion = resource.flush().map_err(Error::Io);
    resolve(primary, completion)
}

fn complete<R: CloseResource + ?Sized>(resource: &mut R, ignore_close_errors: bool) -> Result<()> {
    resource.flush()?;
    let closed = resource.close();
    if ignore_close_errors {
        Ok(())
    } else {
        Ok(closed?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        flush_error: Option<io::ErrorKind>,
        close_error: Option<io::ErrorKind>,
        flushed: u32,
        closed: u32,
    }

    impl Probe {
        fn ok() -> Self {
            Self {
                flush_error: None,
                close_error: None,
                flushed: 0,
                closed: 0,
            }
        }

        fn failing(flush: Option<io::ErrorKind>, close: Option<io::ErrorKind>) -> Self {
            Self {
                flush_error: flush,
                close_error: close,
                ..Self::ok()
            }
        }
    }

    impl CloseResource for Probe {
        fn flush(&mut self) -> io::Result<()> {
            self.flushed += 1;
            match self.flush_error {
                Some(kind) => Err(kind.into()),
                None => Ok(()),
            }
        }

        fn close(&mut self) -> io::Result<()> {
            self.closed += 1;
            match self.close_error {
                Some(kind) => Err(kind.into()),
                None => Ok(()),
            }
        }
    }

    fn io_err() -> Error {
        Error::Io(io::ErrorKind::BrokenPipe.into())
    }

    #[test]
    fn test_resolve_primary_wins() {
        assert!(matches!(resolve(Ok(1), Ok(())), Ok(1)));
        assert!(matches!(resolve::<i32>(Err(io_err()), Ok(())), Err(Error::Io(_))));
        assert!(matches!(resolve(Ok(1), Err(io_err())), Err(Error::Io(_))));
        // Both failed: the primary error surfaces, the completion error is dropped.
        assert!(matches!(
            resolve::<i32>(Err(Error::OutputClosed), Err(io_err())),
            Err(Error::OutputClosed)
        ));
    }

    #[test]
    fn test_closing_completes_even_on_failure() {
        let mut probe = Probe::ok();
        let result = closing(&mut probe, true, |_| Err::<(), _>(Error::OutputClosed));
        assert!(matches!(result, Err(Error::OutputClosed)));
        assert_eq!(probe.flushed, 1);
        assert_eq!(probe.closed, 1);
    }

    #[test]
    fn test_closing_flush_failure_always_surfaces() {
        let mut probe = Probe::failing(Some(io::ErrorKind::BrokenPipe), None);
        let result = closing(&mut probe, true, |_| Ok(()));
        assert!(matches!(result, Err(Error::Io(_))));
        // Flush failed before the close step was reached.
        assert_eq!(probe.closed, 0);
    }

    #[test]
    fn test_closing_close_failure_honors_flag() {
        let mut probe = Probe::failing(None, Some(io::ErrorKind::BrokenPipe));
        assert!(closing(&mut probe, true, |_| Ok(())).is_ok());

        let mut probe = Probe::failing(None, Some(io::ErrorKind::BrokenPipe));
        assert!(matches!(
            closing(&mut probe, false, |_| Ok(())),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_closing_primary_error_masks_completion_error() {
        let mut probe = Probe::failing(Some(io::ErrorKind::BrokenPipe), None);
        let result = closing(&mut probe, false, |_| Err::<(), _>(Error::OutputClosed));
        assert!(matches!(result, Err(Error::OutputClosed)));
        assert_eq!(probe.flushed, 1);
    }

    #[test]
    fn test_flushing_leaves_resource_open() {
        let mut probe = Probe::ok();
        assert!(flushing(&mut probe, |_| Ok(())).is_ok());
        assert_eq!(probe.flushed, 1);
        assert_eq!(probe.closed, 0);
    }
}

//! Writer compositor over the manager's destinations
//!
//! A [`SinkWriter`] is a cheap `io::Write` handle hanging off a shared
//! manager. It resolves its destination at write time, so a handle obtained
//! before `update_config` keeps working against the newly bound sink.

use super::error::SinkError;
use super::manager::ManagerInner;
use std::io::{self, Write};
use std::sync::Arc;

/// Which destination(s) a [`SinkWriter`] targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteTarget {
    /// The single active destination: file in file mode, stdout otherwise
    Active,
    /// Fan out every write to stdout and the file
    Tee,
}

/// `io::Write` handle over a manager's destination(s)
pub struct SinkWriter {
    inner: Arc<ManagerInner>,
    target: WriteTarget,
}

impl SinkWriter {
    pub(crate) fn new(inner: Arc<ManagerInner>, target: WriteTarget) -> Self {
        Self { inner, target }
    }
}

fn to_io_error(err: SinkError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.inner.state.write();
        match self.target {
            WriteTarget::Active => match state.sink.as_mut() {
                Some(sink) => sink.write(buf).map_err(to_io_error),
                None => {
                    drop(state);
                    io::stdout().lock().write(buf)
                }
            },
            WriteTarget::Tee => {
                io::stdout().lock().write_all(buf)?;
                if let Some(sink) = state.sink.as_mut() {
                    sink.write(buf).map_err(to_io_error)?;
                }
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.inner.state.write();
        let file_mode = state.sink.is_some();
        if let Some(sink) = state.sink.as_mut() {
            sink.flush().map_err(to_io_error)?;
        }
        drop(state);
        if self.target == WriteTarget::Tee || !file_mode {
            io::stdout().lock().flush()?;
        }
        Ok(())
    }
}

//! USB transport boundary
//!
//! The bridge is reached through a pair of bulk endpoints. The core only
//! needs a byte-in/byte-out device with a per-call timeout; discovery,
//! interface claiming and closing belong to the implementation (closing
//! happens on `Drop`).

use std::time::Duration;

use crate::error::Result;

/// Byte-oriented bulk transport to the bridge
///
/// One request is outstanding at a time: the engine writes a packet and,
/// where the command has a response, reads it before sending the next one.
pub trait Transport {
    /// Send `data`, returning the number of bytes the device accepted
    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<usize>;

    /// Receive at most `max_len` bytes
    fn read(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<usize> {
        (**self).write(data, timeout)
    }

    fn read(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>> {
        (**self).read(max_len, timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<usize> {
        (**self).write(data, timeout)
    }

    fn read(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>> {
        (**self).read(max_len, timeout)
    }
}

/// Boxed transport, as handed out by programmer selection
pub type BoxedTransport = Box<dyn Transport>;

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted transport for unit tests

    use std::collections::VecDeque;

    use super::*;
    use crate::error::Error;

    /// Records every write and answers reads from a queue
    #[derive(Default)]
    pub struct MockTransport {
        pub writes: Vec<Vec<u8>>,
        pub responses: VecDeque<Vec<u8>>,
        pub read_requests: Vec<usize>,
        /// Report this many fewer bytes than sent on the next write
        pub short_by: usize,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&mut self, data: impl Into<Vec<u8>>) -> &mut Self {
            self.responses.push_back(data.into());
            self
        }
    }

    impl Transport for MockTransport {
        fn write(&mut self, data: &[u8], _timeout: Duration) -> Result<usize> {
            self.writes.push(data.to_vec());
            let short = std::mem::take(&mut self.short_by);
            Ok(data.len() - short)
        }

        fn read(&mut self, max_len: usize, _timeout: Duration) -> Result<Vec<u8>> {
            self.read_requests.push(max_len);
            let mut data = self.responses.pop_front().ok_or(Error::Timeout)?;
            data.truncate(max_len);
            Ok(data)
        }
    }
}

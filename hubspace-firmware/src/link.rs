//! UART transport for the appliance link
//!
//! Wraps the buffered UART halves as a [`SerialLink`]. The buffered
//! driver only reports whether data is ready, so bytes are pulled into a
//! small staging buffer to give the engine an exact count.

use embassy_rp::uart::{self, BufferedUartRx, BufferedUartTx};
use embedded_io::{Read, ReadReady, Write};

use hubspace_hal::SerialLink;

/// Staging buffer size (a bit more than one status frame)
const STAGE_LEN: usize = 16;

/// Transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    Uart(uart::Error),
    /// Read with nothing staged
    Empty,
}

impl From<uart::Error> for LinkError {
    fn from(e: uart::Error) -> Self {
        LinkError::Uart(e)
    }
}

pub struct UartLink {
    rx: BufferedUartRx,
    tx: BufferedUartTx,
    staged: [u8; STAGE_LEN],
    head: usize,
    len: usize,
}

impl UartLink {
    pub fn new(rx: BufferedUartRx, tx: BufferedUartTx) -> Self {
        Self {
            rx,
            tx,
            staged: [0; STAGE_LEN],
            head: 0,
            len: 0,
        }
    }

    /// Refill the staging buffer once it is drained
    fn refill(&mut self) -> Result<(), LinkError> {
        if self.head < self.len || !self.rx.read_ready()? {
            return Ok(());
        }
        let n = self.rx.read(&mut self.staged)?;
        self.head = 0;
        self.len = n;
        Ok(())
    }
}

impl SerialLink for UartLink {
    type Error = LinkError;

    fn bytes_available(&mut self) -> usize {
        if let Err(e) = self.refill() {
            defmt::warn!("UART read error: {}", e);
        }
        self.len - self.head
    }

    fn read_byte(&mut self) -> Result<u8, LinkError> {
        if self.head == self.len {
            return Err(LinkError::Empty);
        }
        let byte = self.staged[self.head];
        self.head += 1;
        Ok(byte)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.tx.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        self.tx.flush()?;
        Ok(())
    }
}

//! Serial link abstractions
//!
//! The appliance link is half-duplex and slow, so the engine never waits
//! on it: reads only happen when [`SerialLink::bytes_available`] says a
//! byte is buffered, and writes are expected to land in a TX buffer.

/// Byte transport to the appliance
///
/// Implementations must deliver received bytes in order and without
/// duplication. Dropped bytes are tolerated by the frame reassembler.
pub trait SerialLink {
    /// Error type for transport operations
    type Error;

    /// Number of received bytes that can be read without blocking
    fn bytes_available(&mut self) -> usize;

    /// Read one buffered byte
    ///
    /// Only called after [`bytes_available`](Self::bytes_available)
    /// reported at least one byte.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Queue bytes for transmission
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

impl<T: SerialLink + ?Sized> SerialLink for &mut T {
    type Error = T::Error;

    fn bytes_available(&mut self) -> usize {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        (**self).read_byte()
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write_bytes(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl UartConfig {
    /// Line settings used by the fan/light appliance: 9600 8N1
    pub const APPLIANCE: Self = Self {
        baudrate: 9600,
        data_bits: DataBits::Eight,
        parity: Parity::None,
        stop_bits: StopBits::One,
    };

    /// Time to shift one byte onto the wire, in microseconds
    ///
    /// Counts the start bit, data bits, parity bit and stop bits.
    pub fn byte_time_us(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        let bits: u32 = 1 + data + parity + stop;
        (bits * 1_000_000).div_ceil(self.baudrate.max(1))
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::APPLIANCE
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

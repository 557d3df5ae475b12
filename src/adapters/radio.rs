//! UART-attached radio transport adapter.
//!
//! Implements [`RadioPort`] for both nodes. The radio module runs in
//! transparent mode; frames are newline-delimited on the UART since the
//! command payloads are single-line ASCII. Addressing, retransmission and
//! link checksums live in the module itself — the firmware sees whole
//! payloads only, with no delivery guarantee.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_hal::uart::UartDriver`.
//! - **all other targets**: queue-backed simulation for host-side tests.

use log::warn;

use crate::app::ports::RadioPort;
use crate::error::HardwareError;

/// Payload bound of the radio module's transparent-mode frame.
pub const MAX_FRAME: usize = 84;

const FRAME_END: u8 = b'\n';

pub struct RadioAdapter {
    #[cfg(target_os = "espidf")]
    uart: esp_idf_hal::uart::UartDriver<'static>,
    #[cfg(target_os = "espidf")]
    rx_buf: heapless::Vec<u8, MAX_FRAME>,

    #[cfg(not(target_os = "espidf"))]
    inbound: std::collections::VecDeque<Vec<u8>>,
    /// Everything the node transmitted, for assertions.
    #[cfg(not(target_os = "espidf"))]
    pub sent: Vec<Vec<u8>>,
}

impl RadioAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(uart: esp_idf_hal::uart::UartDriver<'static>) -> Self {
        Self {
            uart,
            rx_buf: heapless::Vec::new(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            inbound: std::collections::VecDeque::new(),
            sent: Vec::new(),
        }
    }

    /// Queue a frame as if the remote node had transmitted it.
    #[cfg(not(target_os = "espidf"))]
    pub fn inject(&mut self, payload: &[u8]) {
        self.inbound.push_back(payload.to_vec());
    }
}

#[cfg(target_os = "espidf")]
impl RadioPort for RadioAdapter {
    fn max_frame(&self) -> usize {
        MAX_FRAME
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), HardwareError> {
        self.uart
            .write(payload)
            .and_then(|_| self.uart.write(&[FRAME_END]))
            .map(|_| ())
            .map_err(|e| {
                warn!("radio: UART write failed ({e})");
                HardwareError::RadioSendFailed
            })
    }

    fn receive(&mut self, buf: &mut [u8]) -> Option<usize> {
        // Drain whatever the UART holds, yielding at most one frame per
        // call; the rest stays buffered for the next poll.
        let mut byte = [0u8; 1];
        while let Ok(1) = self.uart.read(&mut byte, 0) {
            if byte[0] == FRAME_END {
                let n = self.rx_buf.len().min(buf.len());
                buf[..n].copy_from_slice(&self.rx_buf[..n]);
                self.rx_buf.clear();
                if n > 0 {
                    return Some(n);
                }
                continue;
            }
            if self.rx_buf.push(byte[0]).is_err() {
                warn!("radio: oversize frame dropped");
                self.rx_buf.clear();
            }
        }
        None
    }
}

#[cfg(not(target_os = "espidf"))]
impl RadioPort for RadioAdapter {
    fn max_frame(&self) -> usize {
        MAX_FRAME
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), HardwareError> {
        if payload.len() > MAX_FRAME {
            warn!("radio(sim): frame exceeds module bound");
            return Err(HardwareError::RadioSendFailed);
        }
        self.sent.push(payload.to_vec());
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Option<usize> {
        let frame = self.inbound.pop_front()?;
        let n = frame.len().min(buf.len());
        buf[..n].copy_from_slice(&frame[..n]);
        Some(n)
    }
}

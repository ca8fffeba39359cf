//! Implementation of a software loop-back device.
use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use super::{DataLink, HwAddr};

/// A software device that keeps sent frames in memory.
///
/// Every frame pushed down by the layer above is captured in a queue and can
/// be taken back out with [`dequeue`], which makes it possible to connect
/// two endpoints back to back or to inspect exactly what would have gone on
/// the wire. The tests of the layers above are driven through this device.
///
/// [`dequeue`]: #method.dequeue
pub struct Loopback {
    mtu: usize,
    queue: VecDeque<Frame>,
}

/// One frame captured by the loop-back device.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The link-layer destination the frame was addressed to.
    pub dst: HwAddr,
    /// The datagram bytes handed down by the layer above.
    pub payload: Vec<u8>,
}

impl Loopback {
    /// Create a loop-back device carrying at most `mtu` payload bytes per
    /// frame.
    pub fn new(mtu: usize) -> Self {
        Loopback {
            mtu,
            queue: VecDeque::new(),
        }
    }

    /// Take the oldest captured frame off the device.
    pub fn dequeue(&mut self) -> Option<Frame> {
        self.queue.pop_front()
    }

    /// Number of frames waiting on the device.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no frames are waiting on the device.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl DataLink for Loopback {
    type Addr = HwAddr;

    fn max_payload_size(&self) -> usize {
        self.mtu
    }

    fn send_ip_payload<F>(&mut self, dst: HwAddr, size: usize, fill: F)
        where F: FnOnce(&mut [u8]),
    {
        debug_assert!(size <= self.mtu);
        let mut payload = vec![0; size];
        fill(&mut payload);
        self.queue.push_back(Frame { dst, payload });
    }
}

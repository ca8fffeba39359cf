//! Encapsulates the data-link layer below.
//!
//! The network layer needs exactly two things from the link below it: the
//! payload bound of a single frame, queried once at setup, and send buffers
//! addressed to a link-layer destination, filled in place through a
//! callback. Any device or framing layer providing those two operations
//! implements [`DataLink`]; everything else about it (buffer pooling,
//! queueing policy, the physical medium) stays its own business.
//!
//! [`DataLink`]: trait.DataLink.html
use core::fmt;

pub mod loopback;

/// A data-link layer carrying this stack's datagrams.
pub trait DataLink {
    /// Addresses used by this link to identify hosts.
    type Addr: Copy;

    /// Largest network-layer payload a single frame can carry.
    ///
    /// Queried once when a network endpoint is constructed; the value must
    /// not change afterwards.
    fn max_payload_size(&self) -> usize;

    /// Request a send buffer addressed to `dst` and fill it in place.
    ///
    /// `fill` is invoked exactly once with a buffer of exactly `size` bytes
    /// as soon as the link has one ready; the frame is queued for
    /// transmission when it returns. The buffer may contain stale bytes
    /// from previous frames, the filler is expected to write all of it.
    fn send_ip_payload<F>(&mut self, dst: Self::Addr, size: usize, fill: F)
        where F: FnOnce(&mut [u8]);
}

impl<D: DataLink> DataLink for &'_ mut D {
    type Addr = D::Addr;

    fn max_payload_size(&self) -> usize {
        (**self).max_payload_size()
    }

    fn send_ip_payload<F>(&mut self, dst: Self::Addr, size: usize, fill: F)
        where F: FnOnce(&mut [u8]),
    {
        (**self).send_ip_payload(dst, size, fill)
    }
}

/// A six-octet link-layer address.
///
/// The network layer treats link addresses as opaque tokens; this type
/// exists for links that do not bring their own address type, such as the
/// loop-back device.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct HwAddr(pub [u8; 6]);

impl HwAddr {
    /// Construct a link-layer address from a sequence of octets, in
    /// big-endian.
    ///
    /// # Panics
    /// The function panics if `data` is not six octets long.
    pub fn from_bytes(data: &[u8]) -> HwAddr {
        let mut bytes = [0; 6];
        bytes.copy_from_slice(data);
        HwAddr(bytes)
    }

    /// Return the address as a sequence of octets, in big-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for HwAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
               bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5])
    }
}

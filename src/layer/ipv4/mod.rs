//! The IPv4 network layer.
//!
//! ## Structure
//!
//! The [`Endpoint`] answers for a single address and holds everything the
//! two pipelines need: the data-link layer below, the address resolution
//! service, the owned transport sub-instance, the datagram identification
//! counter and the sends parked on unresolved destinations.
//!
//! ## Receiving datagrams
//!
//! The endpoint consumes byte windows the data-link layer believes to carry
//! IPv4 datagrams. A window runs through an ordered sequence of validation
//! gates (size, version, header length, declared lengths, fragmentation,
//! recipient, checksum) and the first failing gate drops it with a log
//! entry; nothing is ever partially forwarded. Accepted payloads are
//! trimmed to their declared size and dispatched to the transport by
//! protocol number.
//!
//! ## Transmitting datagrams
//!
//! A send names a destination, a protocol, a payload size and a writer that
//! fills the payload directly into the link's buffer. The destination's
//! link-layer address may not be known yet: in that case the send is parked
//! inside the endpoint and finished, or discarded, once the resolution
//! service delivers its answer. Callers learn only whether their writer ran
//! before the call returned.
//!
//! [`Endpoint`]: struct.Endpoint.html
use crate::wire::{IpProtocol, Ipv4Address};

mod endpoint;
#[cfg(test)]
mod tests;

pub use endpoint::Endpoint;

/// The transport protocol carried above this layer.
pub trait Transport {
    /// The well-known protocol number dispatched to this transport.
    ///
    /// Inbound datagrams carrying any other protocol number are dropped.
    const PROTOCOL: IpProtocol;

    /// Learn the largest payload the layer below will carry.
    ///
    /// Called exactly once while the owning endpoint is constructed, before
    /// any segment is delivered, so the transport can size its segments.
    fn init(&mut self, max_payload_size: usize);

    /// Process one segment addressed to this host.
    ///
    /// `segment` is trimmed to the size the sender declared; link-layer
    /// padding never shows up here.
    fn receive_segment(&mut self, src: Ipv4Address, segment: &[u8]);
}

impl<T: Transport> Transport for &'_ mut T {
    const PROTOCOL: IpProtocol = T::PROTOCOL;

    fn init(&mut self, max_payload_size: usize) {
        (**self).init(max_payload_size)
    }

    fn receive_segment(&mut self, src: Ipv4Address, segment: &[u8]) {
        (**self).receive_segment(src, segment)
    }
}

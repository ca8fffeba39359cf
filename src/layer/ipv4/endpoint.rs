use core::cmp;

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::link::DataLink;
use crate::resolve::{Lookup, Resolver};
use crate::wire::{ipv4_packet, IpProtocol, Ipv4Address, IPV4_HEADER_SIZE};

use super::Transport;

// Datagrams can never be larger than what the total length field can hold.
const MAX_DATAGRAM_SIZE: usize = 65535;

/// Default time-to-live of egressing datagrams.
///
/// The value is never decremented or checked on receive; this layer answers
/// for a host and forwards nothing.
const DEFAULT_TTL: u8 = 64;

/// Default traffic class of egressing datagrams.
const DEFAULT_TOS: u8 = 0;

/// An IPv4 network endpoint answering for a single address.
///
/// The endpoint binds the data-link layer below, the address resolution
/// service and the transport protocol above into the two datagram pipelines
/// and lives for the duration of the process. It must be driven from a
/// single task: every operation takes `&mut self`, the identification
/// counter is not atomic, and parked sends are not `Send`.
///
/// All three collaborators may be held by value or by mutable reference;
/// the traits are implemented for both.
pub struct Endpoint<D, R, T>
where
    D: DataLink,
    R: Resolver<LinkAddr = D::Addr>,
    T: Transport,
{
    link: D,
    resolver: R,
    transport: T,

    /// The instance's own address.
    addr: Ipv4Address,

    /// Largest payload of a single datagram. Doesn't change after
    /// construction.
    max_payload_size: usize,

    /// Identification of the next egressing datagram.
    ///
    /// Incremented on every send regardless of destination, wrapping at the
    /// field width.
    next_ident: u16,

    /// Sends parked until their destination resolves.
    pending: Vec<PendingSend>,
}

/// A send whose destination is still being resolved.
struct PendingSend {
    dst: Ipv4Address,
    protocol: IpProtocol,
    payload_size: usize,
    writer: Box<dyn FnOnce(&mut [u8])>,
}

impl<D, R, T> Endpoint<D, R, T>
where
    D: DataLink,
    R: Resolver<LinkAddr = D::Addr>,
    T: Transport,
{
    /// Create an endpoint answering for `addr`.
    ///
    /// The payload bound is derived once from the data-link layer, capped
    /// at the largest representable datagram; the transport sub-instance is
    /// told about it afterwards, as it sizes its segments from the bound.
    ///
    /// # Panics
    /// Panics if the data-link layer can not carry even a bare header.
    pub fn new(link: D, resolver: R, mut transport: T, addr: Ipv4Address) -> Self {
        let link_bound = link.max_payload_size();
        assert!(link_bound > IPV4_HEADER_SIZE,
                "data-link payload bound of {} bytes can not carry a datagram", link_bound);

        let max_payload_size = cmp::min(link_bound, MAX_DATAGRAM_SIZE) - IPV4_HEADER_SIZE;
        transport.init(max_payload_size);

        Endpoint {
            link,
            resolver,
            transport,
            addr,
            max_payload_size,
            next_ident: 0,
            pending: Vec::new(),
        }
    }

    /// The address this endpoint answers for.
    pub fn addr(&self) -> Ipv4Address {
        self.addr
    }

    /// Largest payload acceptable to [`send_payload`].
    ///
    /// [`send_payload`]: #method.send_payload
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    /// Access the data-link layer below.
    pub fn link(&self) -> &D {
        &self.link
    }

    /// Mutably access the data-link layer below.
    pub fn link_mut(&mut self) -> &mut D {
        &mut self.link
    }

    /// Access the resolution service.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Mutably access the resolution service.
    pub fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }

    /// Access the transport sub-instance.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably access the transport sub-instance.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Process a datagram delivered by the data-link layer.
    ///
    /// `window` is the link-layer payload without framing, believed to
    /// carry an IPv4 datagram. The window runs through the validation gates
    /// in order and the first failing gate drops it with a log entry; IP
    /// is a best-effort service and nothing is reported to the caller. An
    /// accepted payload is trimmed to its declared size and handed to the
    /// transport together with the decoded source address.
    pub fn receive_datagram(&mut self, window: &[u8]) {
        if window.len() < IPV4_HEADER_SIZE {
            net_debug!("datagram ignored: {} bytes is too small to hold a header",
                       window.len());
            return;
        }

        let packet = ipv4_packet::new_unchecked(window);
        let src = packet.src_addr();

        if packet.version() != 4 {
            net_debug!("datagram from {} ignored: invalid version (received {}, expected 4)",
                       src, packet.version());
            return;
        }

        if packet.header_len() as usize != IPV4_HEADER_SIZE {
            net_debug!("datagram from {} ignored: options are not supported (header of {} bytes)",
                       src, packet.header_len());
            return;
        }

        let header_size = packet.header_len() as usize;
        let total_size = packet.total_len() as usize;

        if total_size < header_size {
            net_debug!("datagram from {} ignored: total length ({}) is less than the header size ({})",
                       src, total_size, header_size);
            return;
        }

        if window.len() < total_size {
            net_debug!("datagram from {} ignored: truncated ({} bytes delivered, {} declared)",
                       src, window.len(), total_size);
            return;
        }

        if packet.more_frags() || packet.frag_offset() != 0 {
            net_debug!("datagram from {} ignored: fragmented datagrams are not supported",
                       src);
            return;
        }

        if packet.dst_addr() != self.addr {
            net_debug!("datagram from {} ignored: bad recipient ({})",
                       src, packet.dst_addr());
            return;
        }

        if !packet.verify_checksum() {
            net_debug!("datagram from {} ignored: invalid checksum", src);
            return;
        }

        // The frame could contain a small padding at its end.
        let payload = packet.payload_slice();

        if packet.protocol() == T::PROTOCOL {
            net_trace!("receiving a {} byte datagram from {}", total_size, src);
            self.transport.receive_segment(src, payload);
        } else {
            net_debug!("datagram from {} ignored: unknown protocol ({})",
                       src, packet.protocol());
        }
    }

    /// Compose a datagram and push it to the data-link layer.
    ///
    /// `payload_writer` fills the payload directly into the link's send
    /// buffer, after the header; there is no intermediate copy. Its
    /// execution can be delayed past the return of this function if the
    /// destination's link-layer address must first be resolved. Take care
    /// not to capture memory that could be invalidated before it runs.
    ///
    /// Sends are fire and forget: an unreachable destination is logged and
    /// the payload writer is simply never invoked.
    ///
    /// Returns `true` if the payload writer execution has not been delayed.
    ///
    /// # Panics
    /// Panics if `payload_size` exceeds [`max_payload_size`]; that is a bug
    /// in the caller, not a condition of the network.
    ///
    /// [`max_payload_size`]: #method.max_payload_size
    pub fn send_payload<W>(
        &mut self,
        dst: Ipv4Address,
        protocol: IpProtocol,
        payload_size: usize,
        payload_writer: W,
    ) -> bool
    where
        W: FnOnce(&mut [u8]) + 'static,
    {
        assert!(payload_size <= self.max_payload_size,
                "payload of {} bytes exceeds the bound of {} bytes",
                payload_size, self.max_payload_size);

        match self.resolver.lookup(dst) {
            Lookup::Found(link_dst) => {
                self.emit(link_dst, dst, protocol, payload_size, payload_writer);
                true
            }
            Lookup::Unreachable => {
                net_debug!("unreachable address: {}", dst);
                true
            }
            Lookup::Pending => {
                self.pending.push(PendingSend {
                    dst,
                    protocol,
                    payload_size,
                    writer: Box::new(payload_writer),
                });
                false
            }
        }
    }

    /// Equivalent to [`send_payload`] with the transport's protocol number.
    ///
    /// This is the entry point the transport sub-instance is expected to
    /// use for its own segments.
    ///
    /// [`send_payload`]: #method.send_payload
    pub fn send_transport_payload<W>(
        &mut self,
        dst: Ipv4Address,
        payload_size: usize,
        payload_writer: W,
    ) -> bool
    where
        W: FnOnce(&mut [u8]) + 'static,
    {
        self.send_payload(dst, T::PROTOCOL, payload_size, payload_writer)
    }

    /// Deliver the outcome of a deferred address lookup.
    ///
    /// The resolution service calls this, from whatever context it
    /// delivers results in, once a lookup it previously answered with
    /// [`Lookup::Pending`] concludes. Every send parked on `dst` is then
    /// finished in submission order, or silently discarded when the address
    /// turned out unreachable; sends on other destinations stay parked.
    ///
    /// [`Lookup::Pending`]: ../../resolve/enum.Lookup.html#variant.Pending
    pub fn resolution_complete(&mut self, dst: Ipv4Address, link_dst: Option<D::Addr>) {
        let mut completed = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].dst == dst {
                completed.push(self.pending.remove(index));
            } else {
                index += 1;
            }
        }

        match link_dst {
            Some(link_dst) => {
                for send in completed {
                    self.emit(link_dst, send.dst, send.protocol, send.payload_size, send.writer);
                }
            }
            None => {
                if !completed.is_empty() {
                    net_debug!("unreachable address: {} ({} parked sends dropped)",
                               dst, completed.len());
                }
            }
        }
    }

    /// Number of sends currently parked on unresolved destinations.
    pub fn pending_sends(&self) -> usize {
        self.pending.len()
    }

    fn emit<W>(
        &mut self,
        link_dst: D::Addr,
        dst: Ipv4Address,
        protocol: IpProtocol,
        payload_size: usize,
        payload_writer: W,
    )
    where
        W: FnOnce(&mut [u8]),
    {
        let datagram_size = IPV4_HEADER_SIZE + payload_size;

        net_trace!("sending a {} byte datagram to {} with protocol {}",
                   datagram_size, dst, protocol);

        let datagram_id = self.next_ident;
        self.next_ident = self.next_ident.wrapping_add(1);

        let src = self.addr;
        self.link.send_ip_payload(link_dst, datagram_size, move |buffer| {
            let packet = ipv4_packet::new_unchecked_mut(buffer);
            packet.set_version(4);
            packet.set_header_len(IPV4_HEADER_SIZE as u8);
            packet.set_tos(DEFAULT_TOS);
            packet.set_total_len(datagram_size as u16);
            packet.set_ident(datagram_id);
            packet.clear_flags();
            packet.set_dont_frag(true);
            packet.set_more_frags(false);
            packet.set_frag_offset(0);
            packet.set_ttl(DEFAULT_TTL);
            packet.set_protocol(protocol);
            packet.set_src_addr(src);
            packet.set_dst_addr(dst);
            packet.fill_checksum();

            payload_writer(packet.payload_mut_slice());
        });
    }
}

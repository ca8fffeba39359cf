/*! Low-level packet access and construction.

# An overview over the packet representation

The `wire` module deals with the datagram *representation*. It provides
functions to extract fields from sequences of octets, and to insert fields
into sequences of octets. This happens in the lowercase [`ipv4_packet`]
structure, a dynamically sized newtype over `[u8]` whose accessors read and
write the exact RFC 791 wire layout.

All multi-byte fields are converted explicitly between host and network
order; the version/header-length bitfield byte is decoded by shift-and-mask.
Nothing here depends on in-memory struct layout or host endianness.

The module also hosts the internet-checksum primitives in [`checksum`],
shared with the transport layer above through the pseudo-header sum.

[`ipv4_packet`]: struct.ipv4_packet.html
[`checksum`]: checksum/index.html

The `ipv4_packet` structure guarantees that, if [`check_len`] returned
`Ok(())`, then no field accessor or setter method will panic. When parsing
untrusted input it is *necessary* to go through [`new_checked`]; so long as
the buffer is not modified, no accessor will fail afterwards.

[`check_len`]: struct.ipv4_packet.html#method.check_len
[`new_checked`]: struct.ipv4_packet.html#method.new_checked
*/
#![allow(missing_docs)]

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
}

pub mod checksum;
mod error;
mod ipv4;

pub use self::error::{
    Error,
    Result};

pub use self::ipv4::{
    ipv4 as ipv4_packet,
    Address as Ipv4Address,
    Protocol as IpProtocol,
    HEADER_SIZE as IPV4_HEADER_SIZE};

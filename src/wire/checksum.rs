//! Internet checksum primitives.
//!
//! The [RFC 1071] ones-complement sum guards the datagram header and, through
//! the pseudo-header sum, the transport segments carried above it. All
//! functions here return *partial* sums: foldable accumulators that still
//! need the final ones-complement before hitting the wire. This is what
//! makes them combinable: a transport layer adds [`pseudo_header`] to the
//! sum of its own segment bytes without knowing anything about the datagram
//! header layout.
//!
//! [RFC 1071]: https://tools.ietf.org/html/rfc1071
//! [`pseudo_header`]: fn.pseudo_header.html
use byteorder::{ByteOrder, NetworkEndian};

use super::ipv4::{Address, Protocol};

fn propagate_carries(word: u32) -> u16 {
    let sum = (word >> 16) + (word & 0xffff);
    ((sum >> 16) as u16) + (sum as u16)
}

/// Compute an RFC 1071 compliant checksum (without the final complement).
pub fn data(mut data: &[u8]) -> u16 {
    let mut accum = 0;

    // For each 32-byte chunk...
    const CHUNK_SIZE: usize = 32;
    while data.len() >= CHUNK_SIZE {
        let mut d = &data[..CHUNK_SIZE];
        // ... take by 2 bytes and sum them.
        while d.len() >= 2 {
            accum += NetworkEndian::read_u16(d) as u32;
            d = &d[2..];
        }

        data = &data[CHUNK_SIZE..];
    }

    // Sum the rest that does not fit the last 32-byte chunk,
    // taking by 2 bytes.
    while data.len() >= 2 {
        accum += NetworkEndian::read_u16(data) as u32;
        data = &data[2..];
    }

    // Add the last remaining odd byte, if any.
    if let Some(&value) = data.first() {
        accum += (value as u32) << 8;
    }

    propagate_carries(accum)
}

/// Combine several RFC 1071 compliant checksums.
pub fn combine(checksums: &[u16]) -> u16 {
    let mut accum: u32 = 0;
    for &word in checksums {
        accum += word as u32;
    }
    propagate_carries(accum)
}

/// Compute the partial checksum of a transport pseudo header.
///
/// Transport checksums cover the segment and a pseudo header that is never
/// transmitted:
///
/// ```text
/// +--------------------------------------------+
/// |           Source network address           |
/// +--------------------------------------------+
/// |         Destination network address        |
/// +----------+----------+----------------------+
/// |   zero   | Protocol |     Segment size     |
/// +----------+----------+----------------------+
/// ```
///
/// The layout depends on the network protocol carrying the segment, which is
/// why the transport layer consumes it from here instead of defining it
/// itself.
pub fn pseudo_header(
    src_addr: Address,
    dst_addr: Address,
    protocol: Protocol,
    length: u16,
) -> u16 {
    let mut proto_len = [0u8; 4];
    proto_len[1] = protocol.into();
    NetworkEndian::write_u16(&mut proto_len[2..4], length);

    combine(&[
        data(src_addr.as_bytes()),
        data(dst_addr.as_bytes()),
        data(&proto_len[..]),
    ])
}

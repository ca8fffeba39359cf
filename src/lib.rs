//! An IPv4 network layer for user-space networking stacks.
//!
//! This library is the network layer of a layered packet-processing stack:
//! it sits between a data-link layer below and a transport protocol above.
//! Inbound, it validates raw link-layer payloads as IPv4 datagrams and
//! forwards accepted payloads upwards; outbound, it resolves the next hop's
//! link-layer address, writes a checksummed header and hands the finished
//! datagram to the link below.
//!
//! ## Design and relevant core concepts
//!
//! The layer handles packets with callbacks and never blocks. Receiving is a
//! straight pipeline of validation gates over an untrusted byte window;
//! anything that fails a gate is logged and dropped, as IP is a best-effort
//! datagram service. Sending writes headers and payloads directly into
//! buffers provided by the data-link layer, without intermediate copies.
//!
//! The single asynchronous dependency is link-layer address resolution. A
//! send whose destination is not yet resolved is parked inside the endpoint
//! and finished (or discarded) when the resolution service delivers its
//! answer; the caller is told only whether its payload writer ran before the
//! call returned. See [`layer::ipv4::Endpoint`] for the exact contract.
//!
//! Collaborating layers are compile-time parameters: any data-link that can
//! state its payload bound and hand out addressed send buffers implements
//! [`link::DataLink`], any resolution service implements
//! [`resolve::Resolver`], and the transport above implements
//! [`layer::ipv4::Transport`]. All dispatch is static.
//!
//! [`layer::ipv4::Endpoint`]: layer/ipv4/struct.Endpoint.html
//! [`layer::ipv4::Transport`]: layer/ipv4/trait.Transport.html
//! [`link::DataLink`]: link/trait.DataLink.html
//! [`resolve::Resolver`]: resolve/trait.Resolver.html
#![warn(missing_docs)]
#![warn(unreachable_pub)]

// tests should be able to use `std`
#![cfg_attr(all(
    not(feature = "std"),
    not(test)),
no_std)]

extern crate alloc;

#[macro_use] mod macros;
pub mod layer;
pub mod link;
pub mod resolve;
pub mod wire;

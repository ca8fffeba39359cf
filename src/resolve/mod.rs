//! Link-layer address resolution, as seen from the network layer.
//!
//! Resolution protocols keep their own caches, retry timers and transaction
//! state; none of that concerns the network layer. What it needs is an
//! answer to "which link-layer address carries traffic for this network
//! address?", where the answer may legitimately be "not yet known, I am
//! asking", since resolution runs over the same network the datagram wants
//! to use. The [`Resolver`] trait captures exactly that question, and
//! [`Lookup`] the three possible answers.
//!
//! A deferred answer is later delivered to the network endpoint's
//! [`resolution_complete`], from whatever scheduling context the service
//! uses; the endpoint keeps the affected sends parked until then.
//!
//! [`Resolver`]: trait.Resolver.html
//! [`Lookup`]: enum.Lookup.html
//! [`resolution_complete`]: ../layer/ipv4/struct.Endpoint.html#method.resolution_complete
use alloc::collections::BTreeMap;

use crate::wire::Ipv4Address;

/// An answer to a link-layer address lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<A> {
    /// The mapping was already known.
    Found(A),

    /// A resolution transaction was started; the outcome arrives later.
    Pending,

    /// The address can not be resolved.
    Unreachable,
}

/// A link-layer address resolution service.
pub trait Resolver {
    /// Addresses of the link this service resolves to.
    type LinkAddr: Copy;

    /// Translate a network address into a link-layer address.
    ///
    /// Answering [`Lookup::Pending`] obliges the service to eventually
    /// deliver the outcome of the started transaction to the endpoint that
    /// asked, through its `resolution_complete` entry point.
    ///
    /// [`Lookup::Pending`]: enum.Lookup.html#variant.Pending
    fn lookup(&mut self, addr: Ipv4Address) -> Lookup<Self::LinkAddr>;
}

impl<R: Resolver> Resolver for &'_ mut R {
    type LinkAddr = R::LinkAddr;

    fn lookup(&mut self, addr: Ipv4Address) -> Lookup<Self::LinkAddr> {
        (**self).lookup(addr)
    }
}

/// A resolver backed by a fixed table.
///
/// Answers [`Lookup::Found`] for every filled entry and
/// [`Lookup::Unreachable`] otherwise; it never defers. Useful for statically
/// configured deployments and for driving the send pipeline in tests.
///
/// [`Lookup::Found`]: enum.Lookup.html#variant.Found
/// [`Lookup::Unreachable`]: enum.Lookup.html#variant.Unreachable
#[derive(Debug, Clone)]
pub struct Table<A> {
    entries: BTreeMap<Ipv4Address, A>,
}

impl<A: Copy> Table<A> {
    /// Create an empty table.
    pub fn new() -> Self {
        Table {
            entries: BTreeMap::new(),
        }
    }

    /// Add an entry, returning the previous mapping if there was one.
    pub fn fill(&mut self, addr: Ipv4Address, link: A) -> Option<A> {
        self.entries.insert(addr, link)
    }

    /// Remove an entry.
    pub fn forget(&mut self, addr: Ipv4Address) -> Option<A> {
        self.entries.remove(&addr)
    }

    /// Look an address up without going through the trait.
    pub fn lookup_pure(&self, addr: Ipv4Address) -> Option<A> {
        self.entries.get(&addr).copied()
    }
}

impl<A: Copy> Default for Table<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Copy> Resolver for Table<A> {
    type LinkAddr = A;

    fn lookup(&mut self, addr: Ipv4Address) -> Lookup<A> {
        match self.entries.get(&addr) {
            Some(&link) => Lookup::Found(link),
            None => Lookup::Unreachable,
        }
    }
}

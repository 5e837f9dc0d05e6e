//! Routing-table core of a Kademlia DHT node.
//!
//! This crate is the hard, self-contained part of a Kademlia
//! implementation: the 160-bit identifier space ([`Id`]), the
//! bucket-split data structure that organizes known peers by XOR distance
//! ([`Bucket`]), and the routing table that partitions the whole space into
//! a growing sequence of such buckets ([`RoutingTable`]).
//!
//! Everything a real DHT node also needs — a transport, an iterative
//! lookup/bootstrap driver, replicated storage with expiration, a CLI — is
//! deliberately left out. Those are external collaborators that call into
//! this crate's primitives; none of them live here. There is no network
//! I/O, no persistence, and no wire format in this crate.
#![forbid(unsafe_code)]

mod bucket;
mod config;
mod id;
mod routing_table;

pub use bucket::{Bound, Bucket, Peer};
pub use config::RoutingConfig;
pub use id::{Id, IdError, ID_BITS, ID_LEN};
pub use routing_table::{BucketStats, RoutingTable};

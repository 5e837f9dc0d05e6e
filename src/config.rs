/// Tunables for [`crate::RoutingTable`], named the way the Kademlia paper
/// names them rather than hardcoded, so tests can exercise small buckets
/// without waiting for 20 entries.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RoutingConfig {
    /// Maximum size of a bucket's `nodes` list. Also called `k` in the
    /// original paper. The replacement cache is bounded by the same value.
    pub bucket_size: usize,

    /// A full bucket is only allowed to split when its own depth is not a
    /// multiple of `split_modulus`, or when the bucket's range contains the
    /// table's own id (section 4.2 of the Kademlia paper). Called `b` in
    /// the paper.
    pub split_modulus: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            bucket_size: 20,
            split_modulus: 5,
        }
    }
}

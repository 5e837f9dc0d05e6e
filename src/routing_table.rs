use crate::bucket::{Bound, Bucket, Peer};
use crate::config::RoutingConfig;
use crate::id::Id;

/// Diagnostic snapshot of one bucket, yielded by [`RoutingTable::iter_buckets`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketStats {
    pub lower: Id,
    pub upper: Bound,
    pub node_count: usize,
    pub replacement_count: usize,
    pub depth: usize,
}

/// An ordered partition of the identifier space into a growing sequence of
/// buckets, biased by an `own` id that decides which buckets are allowed to
/// split past the usual capacity.
///
/// Not internally synchronized: a single logical owner is expected to run
/// all operations serially, or to hold a coarse lock around each call (see
/// the crate's concurrency notes). No operation blocks, allocates unbounded
/// memory, or runs for longer than a linear scan over at most `bucket_size`
/// entries or 160 buckets.
pub struct RoutingTable<E> {
    own: Id,
    config: RoutingConfig,
    buckets: Vec<Bucket<E>>,
}

impl<E> RoutingTable<E> {
    /// A table for `own`, with the paper's default tunables
    /// ([`RoutingConfig::default`]) and a single bucket spanning the whole
    /// identifier space.
    pub fn new(own: Id) -> Self {
        Self::with_config(own, RoutingConfig::default())
    }

    pub fn with_config(own: Id, config: RoutingConfig) -> Self {
        RoutingTable {
            own,
            config,
            buckets: vec![Bucket::new_full()],
        }
    }

    pub fn own(&self) -> Id {
        self.own
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Total number of buckets currently partitioning the space.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Diagnostic iterator over every bucket's range and occupancy.
    pub fn iter_buckets(&self) -> impl Iterator<Item = BucketStats> + '_ {
        self.buckets.iter().map(|b| BucketStats {
            lower: b.lower(),
            upper: b.upper(),
            node_count: b.nodes().len(),
            replacement_count: b.replacements().len(),
            depth: b.depth(),
        })
    }

    /// The unique bucket whose range contains `id`.
    ///
    /// Buckets partition `[0, 2^160)` contiguously and are kept ordered by
    /// ascending `lower`, so the first bucket whose `fits(id)` holds is the
    /// responsible one. Every `Id` lies in `[0, 2^160)` by construction, so
    /// failing to find a bucket here is a partition invariant violation,
    /// not a caller error.
    fn bucket_index(&self, id: Id) -> usize {
        self.buckets
            .iter()
            .position(|b| b.fits(id))
            .expect("routing table partition invariant violated: no bucket fits this id")
    }

    pub fn find_by_id(&self, id: Id) -> Option<&Peer<E>> {
        let idx = self.bucket_index(id);
        self.buckets[idx].find(id)
    }
}

impl<E: Clone> RoutingTable<E> {
    /// Inserts or refreshes a peer. See the split policy in the crate's
    /// module documentation for what happens when the responsible bucket is
    /// full.
    pub fn add(&mut self, id: Id, endpoint: E) -> bool {
        let idx = self.bucket_index(id);
        if self.buckets[idx].add(Peer::new(id, endpoint.clone()), &self.config) {
            return true;
        }

        let bucket = &self.buckets[idx];
        let allowed_to_split = bucket.is_splittable()
            && (bucket.fits_in_range(self.own) || bucket.depth() % self.config.split_modulus != 0);

        if allowed_to_split {
            self.split_bucket(idx);
            return self.add(id, endpoint);
        }

        // Section 4.1 of the Kademlia paper: ping the head of `nodes` and
        // evict it on no response. That requires a transport, which this
        // crate does not have; the caller decides whether to probe and
        // call `remove` itself. A bucket that has shrunk to a single
        // identifier (reachable with a small `bucket_size`) falls through to
        // the same refusal: there is no narrower range left to split into.
        false
    }

    pub fn remove(&mut self, id: Id) -> bool {
        let idx = self.bucket_index(id);
        self.buckets[idx].remove(id)
    }

    /// Peers in the bucket responsible for `id`, sorted by ascending XOR
    /// distance to `id`. Only the single responsible bucket is searched —
    /// it may hold fewer than `bucket_size` peers even when closer peers
    /// exist in a neighboring bucket. Widening the search is an external
    /// driver's concern (see the crate's module documentation).
    pub fn find_closest(&self, id: Id) -> Vec<Peer<E>> {
        let idx = self.bucket_index(id);
        let mut peers: Vec<Peer<E>> = self.buckets[idx].nodes().to_vec();
        peers.sort_by_key(|p| id.distance(&p.id));
        peers
    }

    fn split_bucket(&mut self, idx: usize) {
        let full = self.buckets.remove(idx);
        let (low, high) = full.split(&self.config);
        self.buckets.insert(idx, high);
        self.buckets.insert(idx, low);
    }
}

use crate::config::RoutingConfig;
use crate::id::Id;

/// A peer descriptor: an identifier plus an opaque endpoint handle.
///
/// The bucket and routing table never interpret `endpoint` — the only
/// operation they need on it is "keep it associated with this id".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Peer<E> {
    pub id: Id,
    pub endpoint: E,
}

impl<E> Peer<E> {
    pub fn new(id: Id, endpoint: E) -> Self {
        Peer { id, endpoint }
    }
}

/// The upper bound of a bucket's range.
///
/// `2^160` itself is one past the largest representable [`Id`], so it can't
/// be stored as one; every bucket but the topmost ends at another bucket's
/// `lower`, and the topmost ends at this sentinel instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Id(Id),
    Ceiling,
}

impl Bound {
    fn contains_inclusive(self, id: Id) -> bool {
        match self {
            Bound::Id(b) => id <= b,
            Bound::Ceiling => true,
        }
    }

    fn contains_exclusive(self, id: Id) -> bool {
        match self {
            Bound::Id(b) => id < b,
            Bound::Ceiling => true,
        }
    }
}

/// A bounded ordered list of peers whose identifiers fall in `[lower, upper)`.
///
/// `nodes` is kept in recency order (least-recently-seen at the head,
/// most-recently-seen at the tail); `replacements` is a FIFO overflow queue
/// only consulted once `nodes` is full.
#[derive(Clone, Debug)]
pub struct Bucket<E> {
    lower: Id,
    upper: Bound,
    nodes: Vec<Peer<E>>,
    replacements: Vec<Peer<E>>,
}

impl<E> Bucket<E> {
    /// A single empty bucket covering the whole identifier space.
    pub fn new_full() -> Self {
        Bucket {
            lower: Id::ZERO,
            upper: Bound::Ceiling,
            nodes: Vec::new(),
            replacements: Vec::new(),
        }
    }

    /// An empty bucket covering `[lower, upper)`.
    pub fn with_range(lower: Id, upper: Bound) -> Self {
        Bucket {
            lower,
            upper,
            nodes: Vec::new(),
            replacements: Vec::new(),
        }
    }

    pub fn lower(&self) -> Id {
        self.lower
    }

    pub fn upper(&self) -> Bound {
        self.upper
    }

    pub fn nodes(&self) -> &[Peer<E>] {
        &self.nodes
    }

    pub fn replacements(&self) -> &[Peer<E>] {
        &self.replacements
    }

    /// True iff `id < upper` — used by the routing table to pick the first
    /// bucket, in ascending-`lower` order, whose upper bound exceeds `id`.
    pub fn fits(&self, id: Id) -> bool {
        self.upper.contains_exclusive(id)
    }

    /// True iff `lower <= id <= upper` (inclusive on both ends). Used to
    /// decide whether the table's own id lies inside this bucket's range,
    /// matching the split policy's own semantics.
    pub fn fits_in_range(&self, id: Id) -> bool {
        id >= self.lower && self.upper.contains_inclusive(id)
    }

    /// The length of the longest common binary prefix (MSB-first) of the
    /// identifiers currently in `nodes`; zero if `nodes` is empty.
    pub fn depth(&self) -> usize {
        let mut iter = self.nodes.iter();
        let first = match iter.next() {
            Some(p) => p.id,
            None => return 0,
        };
        let mut common = crate::id::ID_BITS;
        for peer in iter {
            common = common.min(first.distance(&peer.id).leading_zeros());
        }
        common as usize
    }

    pub fn find(&self, id: Id) -> Option<&Peer<E>> {
        self.nodes.iter().find(|p| p.id == id)
    }

    fn position_in_nodes(&self, id: Id) -> Option<usize> {
        self.nodes.iter().position(|p| p.id == id)
    }

    fn position_in_replacements(&self, id: Id) -> Option<usize> {
        self.replacements.iter().position(|p| p.id == id)
    }

    /// Inserts or refreshes `peer`.
    ///
    /// Returns `true` when `peer` ends up in `nodes` (new entry or recency
    /// refresh of an existing one); `false` when `nodes` is full, in which
    /// case `peer` is handed to the replacement cache instead.
    pub fn add(&mut self, peer: Peer<E>, config: &RoutingConfig) -> bool {
        if let Some(idx) = self.position_in_nodes(peer.id) {
            self.nodes.remove(idx);
            self.nodes.push(peer);
            return true;
        }

        if self.nodes.len() < config.bucket_size {
            self.nodes.push(peer);
            return true;
        }

        self.offer_replacement(peer, config);
        false
    }

    fn offer_replacement(&mut self, peer: Peer<E>, config: &RoutingConfig) {
        if let Some(idx) = self.position_in_replacements(peer.id) {
            self.replacements.remove(idx);
            self.replacements.push(peer);
            return;
        }

        if self.replacements.len() >= config.bucket_size {
            self.replacements.remove(0);
        }
        self.replacements.push(peer);
    }

    /// Removes `id` from `nodes` (promoting the most-recently-seen
    /// replacement into the vacated slot, if any) or from `replacements`.
    /// Returns `true` iff `id` was found in either list.
    pub fn remove(&mut self, id: Id) -> bool {
        if let Some(idx) = self.position_in_nodes(id) {
            self.nodes.remove(idx);
            if let Some(promoted) = self.replacements.pop() {
                self.nodes.push(promoted);
            }
            return true;
        }

        if let Some(idx) = self.position_in_replacements(id) {
            self.replacements.remove(idx);
            return true;
        }

        false
    }

    /// True iff this bucket's range spans more than one identifier, so it
    /// can still be bisected by [`split`](Bucket::split). A bucket holding
    /// exactly one identifier (`lower` with no room for a distinct `upper`
    /// neighbor) has nothing left to divide.
    pub(crate) fn is_splittable(&self) -> bool {
        match self.lower.checked_successor() {
            Some(next) => self.fits(next),
            None => false,
        }
    }

    /// Splits `self` into two buckets covering `[lower, mid]` and
    /// `[mid+1, upper)`, re-adding every peer from `nodes` and
    /// `replacements` (in that order) into whichever child contains its id.
    /// Consumes `self`. Callers must check [`is_splittable`](Bucket::is_splittable)
    /// first; splitting a single-identifier range has no valid bisection.
    pub fn split(self, config: &RoutingConfig) -> (Bucket<E>, Bucket<E>) {
        let mid = midpoint(self.lower, self.upper);
        let successor = mid
            .checked_successor()
            .expect("bucket range exhausted: cannot split a singleton identifier range");

        // `successor` is both the low child's exclusive upper bound and the
        // high child's inclusive lower bound, so `low.upper() == high.lower()`
        // and `fits`/`fits_in_range` agree on where `mid` itself lives (in
        // `low`, since placement below is decided against `mid` directly,
        // not by re-deriving it from `low`'s own, narrower, range).
        let mut low = Bucket::with_range(self.lower, Bound::Id(successor));
        let mut high = Bucket::with_range(successor, self.upper);

        for peer in self.nodes.into_iter().chain(self.replacements.into_iter()) {
            if peer.id <= mid {
                low.add(peer, config);
            } else {
                high.add(peer, config);
            }
        }

        (low, high)
    }
}

/// A 168-bit helper used only to average two bucket bounds without
/// overflowing when `upper` is [`Bound::Ceiling`] (`2^160`).
fn midpoint(lower: Id, upper: Bound) -> Id {
    const WIDE_LEN: usize = crate::id::ID_LEN + 1;

    fn wide_from_id(id: Id) -> [u8; WIDE_LEN] {
        let mut buf = [0u8; WIDE_LEN];
        buf[1..].copy_from_slice(&id.to_bytes());
        buf
    }

    fn wide_from_bound(bound: Bound) -> [u8; WIDE_LEN] {
        match bound {
            Bound::Id(id) => wide_from_id(id),
            Bound::Ceiling => {
                let mut buf = [0u8; WIDE_LEN];
                buf[0] = 1;
                buf
            }
        }
    }

    let a = wide_from_id(lower);
    let b = wide_from_bound(upper);

    let mut sum = [0u8; WIDE_LEN];
    let mut carry = 0u16;
    for i in (0..WIDE_LEN).rev() {
        let total = a[i] as u16 + b[i] as u16 + carry;
        sum[i] = total as u8;
        carry = total >> 8;
    }

    let mut half = [0u8; WIDE_LEN];
    let mut carry = 0u8;
    for i in 0..WIDE_LEN {
        let cur = sum[i];
        half[i] = (cur >> 1) | (carry << 7);
        carry = cur & 1;
    }

    let mut out = [0u8; crate::id::ID_LEN];
    out.copy_from_slice(&half[1..]);
    Id::from_bytes(&out).expect("wide->Id truncation always produces ID_LEN bytes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(bucket_size: usize) -> RoutingConfig {
        RoutingConfig {
            bucket_size,
            split_modulus: 5,
        }
    }

    fn id(byte0: u8) -> Id {
        let mut bytes = [0u8; 20];
        bytes[0] = byte0;
        Id::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn fits_is_exclusive_upper() {
        let b: Bucket<()> = Bucket::with_range(id(0), Bound::Id(id(10)));
        assert!(b.fits(id(9)));
        assert!(!b.fits(id(10)));
    }

    #[test]
    fn fits_in_range_is_inclusive_upper() {
        let b: Bucket<()> = Bucket::with_range(id(0), Bound::Id(id(10)));
        assert!(b.fits_in_range(id(10)));
        assert!(!b.fits_in_range(id(11)));
    }

    #[test]
    fn add_fills_then_overflows_to_replacements() {
        let config = cfg(2);
        let mut b = Bucket::new_full();
        assert!(b.add(Peer::new(id(1), ()), &config));
        assert!(b.add(Peer::new(id(2), ()), &config));
        assert!(!b.add(Peer::new(id(3), ()), &config));
        assert_eq!(b.nodes().len(), 2);
        assert_eq!(b.replacements().len(), 1);
        assert_eq!(b.replacements()[0].id, id(3));
    }

    #[test]
    fn re_add_moves_to_tail() {
        let config = cfg(4);
        let mut b = Bucket::new_full();
        b.add(Peer::new(id(1), ()), &config);
        b.add(Peer::new(id(2), ()), &config);
        b.add(Peer::new(id(3), ()), &config);
        b.add(Peer::new(id(1), ()), &config);
        let ids: Vec<_> = b.nodes().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![id(2), id(3), id(1)]);
    }

    #[test]
    fn remove_promotes_most_recent_replacement() {
        let config = cfg(2);
        let mut b = Bucket::new_full();
        b.add(Peer::new(id(1), ()), &config);
        b.add(Peer::new(id(2), ()), &config);
        b.add(Peer::new(id(3), ()), &config); // replacement 1
        b.add(Peer::new(id(4), ()), &config); // replacement 2 (tail)
        assert!(b.remove(id(1)));
        assert_eq!(b.nodes().len(), 2);
        assert!(b.find(id(4)).is_some());
        assert_eq!(b.replacements().len(), 1);
        assert_eq!(b.replacements()[0].id, id(3));
    }

    #[test]
    fn depth_of_empty_bucket_is_zero() {
        let b: Bucket<()> = Bucket::new_full();
        assert_eq!(b.depth(), 0);
    }

    #[test]
    fn depth_is_longest_common_prefix() {
        let config = cfg(10);
        let mut b = Bucket::new_full();
        b.add(Peer::new(id(0b1000_0000), ()), &config);
        b.add(Peer::new(id(0b1000_0001), ()), &config);
        assert_eq!(b.depth(), 7);
    }

    #[test]
    fn split_covers_midpoint_and_preserves_entries() {
        let config = cfg(10);
        let mut b = Bucket::new_full();
        for i in 1..=4u8 {
            b.add(Peer::new(id(i * 40), ()), &config);
        }
        let (low, high) = b.split(&config);
        assert_eq!(low.lower(), Id::ZERO);
        // The partition is contiguous: `low`'s exclusive upper bound is
        // exactly `high`'s inclusive lower bound, with no gap or overlap.
        assert_eq!(low.upper(), Bound::Id(high.lower()));
        let total: usize = low.nodes().len() + high.nodes().len();
        assert_eq!(total, 4);
        for peer in low.nodes() {
            assert!(low.fits(peer.id));
        }
        for peer in high.nodes() {
            assert!(high.fits_in_range(peer.id));
        }
    }

    #[test]
    fn split_places_the_midpoint_id_reachably_in_the_low_child() {
        // [0, 10) splits at mid=5; a peer with id == mid must end up
        // reachable through `low.fits`, not stranded between the two
        // children's exclusive/inclusive bound checks.
        let config = cfg(10);
        let mut b: Bucket<()> = Bucket::with_range(id(0), Bound::Id(id(10)));
        b.add(Peer::new(id(5), ()), &config);
        let (low, high) = b.split(&config);

        assert!(low.fits(id(5)), "mid-valued peer must be reachable via low.fits");
        assert!(!high.fits_in_range(id(5)));
        assert_eq!(low.find(id(5)).map(|p| p.id), Some(id(5)));
        assert!(high.find(id(5)).is_none());
        assert_eq!(low.upper(), Bound::Id(high.lower()));
    }

    #[test]
    fn is_splittable_is_false_for_a_single_identifier_range() {
        let singleton: Bucket<()> = Bucket::with_range(Id::MAX, Bound::Ceiling);
        assert!(!singleton.is_splittable());

        let wide: Bucket<()> = Bucket::with_range(id(0), Bound::Id(id(2)));
        assert!(wide.is_splittable());
    }
}

use time::Duration;

use super::bucket::BucketKey;
use crate::{
    domain::{Frame, Money, Sales, SplitDimension},
    rounding::Interval,
};

/// A frame as it entered the report: rounded, measured and priced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFrame {
    pub frame: Frame,
    /// The rounded interval; running frames end at the report's `now`.
    pub interval: Interval,
    pub duration: Duration,
    pub sales: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    Root,
    Bucket(BucketKey),
}

/// One node of the aggregated report tree.
///
/// The tree is as deep as the split specification; only leaves hold frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: GroupKey,
    /// Dimension this group was split by; `None` for the root.
    pub dimension: Option<SplitDimension>,
    pub label: String,
    pub children: Vec<Group>,
    pub frames: Vec<ReportFrame>,
    pub duration: Duration,
    pub sales: Sales,
    pub frame_count: usize,
    /// Set for groups on the last split level, even when they hold no frames.
    leaf: bool,
}

impl Group {
    pub fn leaf(
        key: BucketKey,
        dimension: SplitDimension,
        label: String,
        frames: Vec<ReportFrame>,
    ) -> Self {
        let mut sales = Sales::new();
        let mut duration = Duration::ZERO;
        for frame in &frames {
            duration += frame.duration;
            if let Some(amount) = &frame.sales {
                sales.add(amount);
            }
        }

        Self {
            key: GroupKey::Bucket(key),
            dimension: Some(dimension),
            label,
            children: Vec::new(),
            frame_count: frames.len(),
            frames,
            duration,
            sales,
            leaf: true,
        }
    }

    pub fn branch(
        key: GroupKey,
        dimension: Option<SplitDimension>,
        label: String,
        children: Vec<Group>,
    ) -> Self {
        let mut sales = Sales::new();
        let mut duration = Duration::ZERO;
        let mut frame_count = 0;
        for child in &children {
            duration += child.duration;
            sales.merge(&child.sales);
            frame_count += child.frame_count;
        }

        Self {
            key,
            dimension,
            label,
            children,
            frames: Vec::new(),
            duration,
            sales,
            frame_count,
            leaf: false,
        }
    }

    /// Whether this group sits on the last split level.
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    pub fn bucket(&self) -> Option<&BucketKey> {
        match &self.key {
            GroupKey::Bucket(key) => Some(key),
            GroupKey::Root => None,
        }
    }

    /// All leaf groups below this one, depth first.
    pub fn leaves(&self) -> Vec<&Group> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Group>) {
        if self.is_leaf() {
            out.push(self);
            return;
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }

    /// Direct child with the given key.
    pub fn child(&self, key: &BucketKey) -> Option<&Group> {
        self.children.iter().find(|c| c.bucket() == Some(key))
    }
}

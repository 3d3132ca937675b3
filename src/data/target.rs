//! Monitor targets: one VMI in one namespace.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// One virtual machine instance to watch.
///
/// Targets are built once per run and handed read-only to the workers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MonitorTarget {
    /// VMI resource name.
    pub name: String,
    /// Namespace the VMI lives in.
    pub namespace: String,
}

impl MonitorTarget {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Namespace split into its prefix and trailing numeric index
    /// (`perf-test-12` -> `("perf-test", Some(12))`).
    fn namespace_key(&self) -> (&str, Option<u64>) {
        match self.namespace.rsplit_once('-') {
            Some((prefix, index)) => (prefix, index.parse().ok()),
            None => (self.namespace.as_str(), None),
        }
    }
}

impl fmt::Display for MonitorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl Ord for MonitorTarget {
    /// Numbered namespaces sort numerically so `-2` comes before `-10`.
    fn cmp(&self, other: &Self) -> Ordering {
        let (prefix, index) = self.namespace_key();
        let (other_prefix, other_index) = other.namespace_key();
        prefix
            .cmp(other_prefix)
            .then(index.cmp(&other_index))
            .then_with(|| self.namespace.cmp(&other.namespace))
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for MonitorTarget {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Inclusive range of numbered test namespaces sharing one VMI name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRange {
    pub start: u32,
    pub end: u32,
    pub namespace_prefix: String,
    pub vm_name: String,
}

impl TargetRange {
    /// Expand the range into `{prefix}-{i}` targets for `i` in `start..=end`.
    pub fn targets(&self) -> Vec<MonitorTarget> {
        (self.start..=self.end)
            .map(|i| {
                MonitorTarget::new(
                    self.vm_name.clone(),
                    format!("{}-{}", self.namespace_prefix, i),
                )
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> TargetRange {
        TargetRange {
            start,
            end,
            namespace_prefix: "kubevirt-perf-test".to_string(),
            vm_name: "rhel-9-vm".to_string(),
        }
    }

    #[test]
    fn test_range_expands_inclusive() {
        let targets = range(1, 3).targets();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].namespace, "kubevirt-perf-test-1");
        assert_eq!(targets[2].namespace, "kubevirt-perf-test-3");
        assert!(targets.iter().all(|t| t.name == "rhel-9-vm"));
    }

    #[test]
    fn test_range_len() {
        assert_eq!(range(1, 1).len(), 1);
        assert_eq!(range(5, 60).len(), 56);
        assert!(range(3, 2).is_empty());
        assert!(range(3, 2).targets().is_empty());
    }

    #[test]
    fn test_display() {
        let target = MonitorTarget::new("vm", "ns-1");
        assert_eq!(target.to_string(), "ns-1/vm");
    }

    #[test]
    fn test_numeric_ordering() {
        let mut targets = vec![
            MonitorTarget::new("vm", "test-10"),
            MonitorTarget::new("vm", "test-2"),
            MonitorTarget::new("vm", "test-1"),
        ];
        targets.sort();
        let order: Vec<_> = targets.iter().map(|t| t.namespace.as_str()).collect();
        assert_eq!(order, vec!["test-1", "test-2", "test-10"]);
    }

    #[test]
    fn test_ordering_is_transitive_with_mixed_suffixes() {
        let ten = MonitorTarget::new("vm", "a-10");
        let odd = MonitorTarget::new("vm", "a-5x");
        let nine = MonitorTarget::new("vm", "a-9");

        assert!(odd < nine);
        assert!(nine < ten);
        assert!(odd < ten);

        let mut targets = vec![ten.clone(), nine.clone(), odd.clone()];
        targets.sort();
        assert_eq!(targets, vec![odd, nine, ten]);
    }

    #[test]
    fn test_ordering_without_index_falls_back_to_name() {
        let a = MonitorTarget::new("vm", "alpha");
        let b = MonitorTarget::new("vm", "beta");
        assert!(a < b);
    }
}

//! Backend-agnostic tree materialization.
//!
//! Every backend discovers hierarchy differently, but depth counting, the
//! depth-exhaustion sentinel, sort positions and title ordering are shared.
//! Backends implement [`TreeSource`] and call [`walk`].

use tracing::trace;

use crate::{
    error::{ArchiveError, Result},
    query::SortOrder,
    record::{Children, Record},
};

/// Options controlling how deep and in which order a tree is materialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeOptions {
    /// `None` walks the whole tree; `Some(1)` returns only the root.
    pub max_depth: Option<u32>,
    /// Reorder siblings by title after positions are assigned.
    pub sort: Option<SortOrder>,
    /// Child filter honoured by backends that support it.
    pub search_pattern: Option<String>,
}

impl TreeOptions {
    pub fn depth(max_depth: u32) -> Self {
        Self {
            max_depth: Some(max_depth),
            ..Default::default()
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_sort(mut self, sort: Option<SortOrder>) -> Self {
        self.sort = sort;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == Some(0) {
            return Err(ArchiveError::InvalidInput(
                "Maximum recursion depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A backend's native hierarchy, seen through its node handles.
pub trait TreeSource {
    /// Backend handle for one node: a tree payload, a row or a slug.
    type Node;

    fn node_id(&self, node: &Self::Node) -> String;

    /// Canonical fields of `node`, without children.
    fn normalize(&mut self, node: &Self::Node) -> Result<Record>;

    /// Immediate children of `node`, in discovery order.
    fn children(&mut self, node: &Self::Node) -> Result<Vec<Self::Node>>;
}

/// Materializes the subtree rooted at `root`.
pub fn walk<S: TreeSource>(source: &mut S, root: &S::Node, options: &TreeOptions) -> Result<Record> {
    options.validate()?;
    let mut position = 0;
    walk_node(source, root, options, 1, &mut position)
}

fn walk_node<S: TreeSource>(
    source: &mut S,
    node: &S::Node,
    options: &TreeOptions,
    depth: u32,
    position: &mut u32,
) -> Result<Record> {
    *position += 1;
    let mut record = source.normalize(node)?;
    record.sort_position = *position;

    let children = source.children(node)?;
    trace!(
        id = %record.id,
        depth,
        children = children.len(),
        "walked tree node"
    );

    record.children = if children.is_empty() {
        Children::None
    } else if options.max_depth == Some(depth) {
        Children::Withheld
    } else {
        let mut records = children
            .iter()
            .map(|child| walk_node(source, child, options, depth + 1, position))
            .collect::<Result<Vec<_>>>()?;
        if let Some(order) = options.sort {
            sort_by_title(&mut records, order);
        }
        Children::Fetched(records)
    };

    Ok(record)
}

/// Stable title ordering; positions are untouched.
pub fn sort_by_title(records: &mut [Record], order: SortOrder) {
    match order {
        SortOrder::Asc => records.sort_by(|a, b| a.title.cmp(&b.title)),
        SortOrder::Desc => records.sort_by(|a, b| b.title.cmp(&a.title)),
    }
}

/// Ids of every descendant of `root`, depth first, root excluded.
pub fn descendant_ids<S: TreeSource>(source: &mut S, root: &S::Node) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    collect_ids(source, root, &mut ids)?;
    Ok(ids)
}

fn collect_ids<S: TreeSource>(source: &mut S, node: &S::Node, ids: &mut Vec<String>) -> Result<()> {
    for child in source.children(node)? {
        ids.push(source.node_id(&child));
        collect_ids(source, &child, ids)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::record::RecordType;

    /// In-memory hierarchy keyed by id, with titles.
    struct MemoryTree {
        titles: HashMap<&'static str, &'static str>,
        edges: HashMap<&'static str, Vec<&'static str>>,
        child_lookups: usize,
    }

    impl MemoryTree {
        fn new(nodes: Vec<(&'static str, &'static str, Vec<&'static str>)>) -> Self {
            let mut titles = HashMap::new();
            let mut edges = HashMap::new();
            for (id, title, children) in nodes {
                titles.insert(id, title);
                edges.insert(id, children);
            }
            Self {
                titles,
                edges,
                child_lookups: 0,
            }
        }
    }

    impl TreeSource for MemoryTree {
        type Node = &'static str;

        fn node_id(&self, node: &Self::Node) -> String {
            node.to_string()
        }

        fn normalize(&mut self, node: &Self::Node) -> Result<Record> {
            let record_type = if *node == "root" {
                RecordType::Resource
            } else {
                RecordType::ResourceComponent
            };
            let mut record = Record::new(*node, record_type);
            record.title = self
                .titles
                .get(node)
                .ok_or_else(|| ArchiveError::Backend(format!("unknown node {node}")))?
                .to_string();
            Ok(record)
        }

        fn children(&mut self, node: &Self::Node) -> Result<Vec<Self::Node>> {
            self.child_lookups += 1;
            Ok(self.edges.get(node).cloned().unwrap_or_default())
        }
    }

    fn sample() -> MemoryTree {
        MemoryTree::new(vec![
            ("root", "Parent", vec!["b", "a"]),
            ("b", "Beta", vec!["b1"]),
            ("b1", "Beta child", vec![]),
            ("a", "Alpha", vec![]),
        ])
    }

    #[test]
    fn test_depth_one_withholds_children() {
        let mut tree = sample();
        let record = walk(&mut tree, &"root", &TreeOptions::depth(1)).unwrap();
        assert_eq!(record.children, Children::Withheld);
        assert!(record.has_children());
        assert_eq!(record.sort_position, 1);
    }

    #[test]
    fn test_depth_two_fetches_immediate_children() {
        let mut tree = sample();
        let record = walk(&mut tree, &"root", &TreeOptions::depth(2)).unwrap();
        let children = record.children.as_slice();
        assert_eq!(children.len(), 2);
        assert!(record.has_children());
        assert_eq!(children[0].children, Children::Withheld);
        assert_eq!(children[1].children, Children::None);
        assert!(!children[1].has_children());
    }

    #[test]
    fn test_full_depth_equals_unbounded() {
        let bounded = walk(&mut sample(), &"root", &TreeOptions::depth(3)).unwrap();
        let unbounded = walk(&mut sample(), &"root", &TreeOptions::unbounded()).unwrap();
        assert_eq!(bounded, unbounded);
    }

    #[test]
    fn test_leaf_root_has_no_children() {
        let mut tree = sample();
        let record = walk(&mut tree, &"a", &TreeOptions::depth(1)).unwrap();
        assert_eq!(record.children, Children::None);
        assert!(!record.has_children());
    }

    #[test]
    fn test_positions_assigned_before_sorting() {
        let mut tree = sample();
        let options = TreeOptions::unbounded().with_sort(Some(SortOrder::Asc));
        let record = walk(&mut tree, &"root", &options).unwrap();
        let children = record.children.as_slice();

        assert_eq!(children[0].title, "Alpha");
        assert_eq!(children[0].sort_position, 4);
        assert_eq!(children[1].title, "Beta");
        assert_eq!(children[1].sort_position, 2);
        assert_eq!(children[1].children.as_slice()[0].sort_position, 3);

        let options = TreeOptions::unbounded().with_sort(Some(SortOrder::Desc));
        let record = walk(&mut sample(), &"root", &options).unwrap();
        assert_eq!(record.children.as_slice()[0].title, "Beta");
    }

    #[test]
    fn test_unsorted_walk_keeps_discovery_order() {
        let record = walk(&mut sample(), &"root", &TreeOptions::unbounded()).unwrap();
        let titles: Vec<&str> = record.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Parent", "Beta", "Beta child", "Alpha"]);
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let mut tree = sample();
        let err = walk(&mut tree, &"root", &TreeOptions::depth(0)).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidInput(_)));
        assert_eq!(tree.child_lookups, 0);
    }

    #[test]
    fn test_normalize_errors_propagate() {
        let mut tree = MemoryTree::new(vec![("root", "Parent", vec!["ghost"])]);
        assert!(walk(&mut tree, &"root", &TreeOptions::unbounded()).is_err());
    }

    #[test]
    fn test_descendant_ids_exclude_root() {
        let mut tree = sample();
        let ids = descendant_ids(&mut tree, &"root").unwrap();
        assert_eq!(ids, vec!["b", "b1", "a"]);
    }
}

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::grouping::GroupedTopCategories;
use super::hidden::HiddenGroupStore;
use super::money::Money;
use super::transaction::Transaction;

/// Display label of the root node.
pub const ROOT_LABEL: &str = "Transactions";

/// Single segment that grouped top-level categories collapse into.
pub const OTHER_SEGMENT: &str = "Other";

const ROOT_TOKEN: &str = "root";
const PATH_SEPARATOR: &str = "::";

/// Composite node identity: depth plus the full prefix path from the root.
///
/// The root sits at depth 0 with an empty path. Every other node's depth is
/// the length of its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    depth: usize,
    path: Vec<String>,
}

impl NodeId {
    pub fn root() -> Self {
        NodeId {
            depth: 0,
            path: Vec::new(),
        }
    }

    pub fn for_path(path: Vec<String>) -> Self {
        NodeId {
            depth: path.len(),
            path,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Identity of the child reached by appending `segment`.
    pub fn child(&self, segment: &str) -> Self {
        let mut path = self.path.clone();
        path.push(segment.to_string());
        NodeId::for_path(path)
    }

    pub fn label(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or(ROOT_LABEL)
    }
}

/// `root`, or `<depth>:<segments joined by "::">`. This is the token handed to
/// renderers and accepted back by [`NodeId::from_str`].
impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(ROOT_TOKEN)
        } else {
            write!(f, "{}:{}", self.depth, self.path.join(PATH_SEPARATOR))
        }
    }
}

impl FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == ROOT_TOKEN {
            return Ok(NodeId::root());
        }

        let (depth, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid node id: '{s}'"))?;
        let depth = depth
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("Invalid node depth in '{s}'"))?;
        let path: Vec<String> = rest
            .split(PATH_SEPARATOR)
            .map(str::trim)
            .filter(|seg| !seg.is_empty())
            .map(str::to_string)
            .collect();

        if path.is_empty() || path.len() != depth {
            return Err(format!("Node depth {depth} does not match path in '{s}'"));
        }
        Ok(NodeId::for_path(path))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    /// Throughput: incoming link total, or outgoing total for the root.
    pub value: Money,
}

/// Edge between two nodes, by index into [`Graph::nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct GraphLink {
    pub source: usize,
    pub target: usize,
    pub value: Money,
}

#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    links: Vec<GraphLink>,
    index: HashMap<NodeId, usize>,
}

/// Serialized link, keyed by node id tokens rather than positions.
#[derive(Serialize)]
struct LinkRef<'a> {
    source: &'a NodeId,
    target: &'a NodeId,
    value: Money,
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let links: Vec<LinkRef<'_>> = self
            .links
            .iter()
            .map(|l| LinkRef {
                source: &self.nodes[l.source].id,
                target: &self.nodes[l.target].id,
                value: l.value,
            })
            .collect();

        let mut state = serializer.serialize_struct("Graph", 2)?;
        state.serialize_field("nodes", &self.nodes)?;
        state.serialize_field("links", &links)?;
        state.end()
    }
}

impl Graph {
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[GraphLink] {
        &self.links
    }

    /// No links means nothing to draw; callers show an empty-state message.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn link_value(&self, source: &NodeId, target: &NodeId) -> Option<Money> {
        let source = *self.index.get(source)?;
        let target = *self.index.get(target)?;
        self.links
            .iter()
            .find(|l| l.source == source && l.target == target)
            .map(|l| l.value)
    }

    /// Direct children of `id`, in creation order.
    pub fn children(&self, id: &NodeId) -> Vec<&GraphNode> {
        let Some(&parent) = self.index.get(id) else {
            return Vec::new();
        };
        self.links
            .iter()
            .filter(|l| l.source == parent)
            .map(|l| &self.nodes[l.target])
            .collect()
    }
}

/// Incremental node/link construction. Nodes and links are created on first
/// sight of a prefix and only their weights change afterwards.
pub struct GraphBuilder {
    nodes: Vec<GraphNode>,
    index: HashMap<NodeId, usize>,
    links: Vec<GraphLink>,
    link_index: HashMap<(usize, usize), usize>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        let mut builder = GraphBuilder {
            nodes: Vec::new(),
            index: HashMap::new(),
            links: Vec::new(),
            link_index: HashMap::new(),
        };
        builder.node(NodeId::root());
        builder
    }

    /// Walks `segments` from the root, adding `value` to every edge on the way.
    pub fn add_path(&mut self, segments: &[String], value: Money) {
        let mut source = 0;
        let mut id = NodeId::root();
        for segment in segments {
            id = id.child(segment);
            let target = self.node(id.clone());
            match self.link_index.get(&(source, target)).copied() {
                Some(i) => self.links[i].value += value,
                None => {
                    self.link_index.insert((source, target), self.links.len());
                    self.links.push(GraphLink {
                        source,
                        target,
                        value,
                    });
                }
            }
            source = target;
        }
    }

    fn node(&mut self, id: NodeId) -> usize {
        if let Some(&i) = self.index.get(&id) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(GraphNode {
            label: id.label().to_string(),
            id: id.clone(),
            value: Money::zero(),
        });
        self.index.insert(id, i);
        i
    }

    pub fn finish(mut self) -> Graph {
        for link in &self.links {
            self.nodes[link.target].value += link.value;
            if link.source == 0 {
                self.nodes[0].value += link.value;
            }
        }
        Graph {
            nodes: self.nodes,
            links: self.links,
            index: self.index,
        }
    }
}

/// Filters, collapses and folds transactions into a flow graph.
///
/// Transactions matching any hidden group are dropped. Those whose top-level
/// category is grouped collapse into the single-level `Other` node.
pub fn build_graph(
    transactions: &[Transaction],
    grouped: &GroupedTopCategories,
    hidden: &HiddenGroupStore,
) -> Graph {
    let other = [OTHER_SEGMENT.to_string()];
    let mut builder = GraphBuilder::new();
    let mut visible = 0usize;

    for tx in transactions {
        if hidden.is_hidden(tx, grouped) {
            continue;
        }
        let path = if grouped.absorbs(tx) {
            &other[..]
        } else {
            tx.segments()
        };
        builder.add_path(path, tx.value());
        visible += 1;
    }

    let graph = builder.finish();
    tracing::debug!(
        transactions = transactions.len(),
        visible,
        nodes = graph.nodes().len(),
        links = graph.links().len(),
        "built flow graph"
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group_top_categories;

    fn tx(category: &str, cents: i64) -> Transaction {
        Transaction::new(category, Money::from_cents(cents)).unwrap()
    }

    fn id(s: &str) -> NodeId {
        s.parse().unwrap()
    }

    // ── NodeId ────────────────────────────────────────────────────────────────

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId::root().to_string(), "root");
        let gas = NodeId::root().child("Auto").child("Gas");
        assert_eq!(gas.to_string(), "2:Auto::Gas");
        assert_eq!(gas.depth(), 2);
        assert_eq!(gas.label(), "Gas");
    }

    #[test]
    fn node_id_parses_back() {
        let gas = NodeId::root().child("Auto").child("Gas");
        assert_eq!(id("2:Auto::Gas"), gas);
        assert_eq!(id("root"), NodeId::root());
    }

    #[test]
    fn node_id_rejects_malformed() {
        assert!("Auto".parse::<NodeId>().is_err());
        assert!("x:Auto".parse::<NodeId>().is_err());
        assert!("1:".parse::<NodeId>().is_err());
        assert!("3:Auto::Gas".parse::<NodeId>().is_err());
    }

    #[test]
    fn node_id_segment_with_single_colon_survives() {
        let odd = NodeId::root().child("a:b");
        assert_eq!(odd.to_string().parse::<NodeId>().unwrap(), odd);
    }

    // ── build_graph ───────────────────────────────────────────────────────────

    #[test]
    fn shared_prefix_reuses_node_and_link() {
        let txs = vec![tx("Auto:Gas", 10000), tx("Auto:Insurance", 5000)];
        let graph = build_graph(&txs, &GroupedTopCategories::default(), &HiddenGroupStore::new());

        assert_eq!(graph.nodes().len(), 4);
        assert_eq!(graph.links().len(), 3);
        assert_eq!(
            graph.link_value(&NodeId::root(), &id("1:Auto")),
            Some(Money::from_cents(15000))
        );
        let children: Vec<&str> = graph
            .children(&id("1:Auto"))
            .iter()
            .map(|n| n.label.as_str())
            .collect();
        assert_eq!(children, vec!["Gas", "Insurance"]);
    }

    #[test]
    fn same_label_at_different_paths_are_distinct_nodes() {
        let txs = vec![tx("Auto:Tax", 100), tx("Home:Tax", 200)];
        let graph = build_graph(&txs, &GroupedTopCategories::default(), &HiddenGroupStore::new());
        assert!(graph.node(&id("2:Auto::Tax")).is_some());
        assert!(graph.node(&id("2:Home::Tax")).is_some());
        assert_eq!(graph.nodes().len(), 5);
    }

    #[test]
    fn grouped_categories_collapse_into_flat_other() {
        let txs = vec![
            tx("Auto:Gas", 10000),
            tx("Tax:State:Late", 500),
            tx("Gifts", 300),
        ];
        let grouped = group_top_categories(&txs, 10.0);
        let graph = build_graph(&txs, &grouped, &HiddenGroupStore::new());

        assert_eq!(
            graph.link_value(&NodeId::root(), &id("1:Other")),
            Some(Money::from_cents(800))
        );
        assert!(graph.children(&id("1:Other")).is_empty());
        assert!(graph.node(&id("1:Tax")).is_none());
    }

    #[test]
    fn node_values_report_throughput() {
        let txs = vec![tx("Auto:Gas", 10000), tx("Auto:Insurance", 5000), tx("Tax", 500)];
        let graph = build_graph(&txs, &GroupedTopCategories::default(), &HiddenGroupStore::new());
        assert_eq!(graph.node(&NodeId::root()).unwrap().value, Money::from_cents(15500));
        assert_eq!(graph.node(&id("1:Auto")).unwrap().value, Money::from_cents(15000));
        assert_eq!(graph.node(&id("2:Auto::Gas")).unwrap().value, Money::from_cents(10000));
    }

    #[test]
    fn amounts_beyond_decimal_range_saturate() {
        let huge = Money::parse("50000000000000000000000000000").unwrap();
        let txs = vec![
            Transaction::new("A", huge).unwrap(),
            Transaction::new("A", huge).unwrap(),
        ];
        let graph = build_graph(&txs, &GroupedTopCategories::default(), &HiddenGroupStore::new());
        assert_eq!(graph.links().len(), 1);
        assert_eq!(
            graph.link_value(&NodeId::root(), &id("1:A")),
            Money::parse("79228162514264337593543950335")
        );
    }

    #[test]
    fn no_transactions_yields_empty_graph() {
        let graph = build_graph(&[], &GroupedTopCategories::default(), &HiddenGroupStore::new());
        assert!(graph.is_empty());
        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.nodes()[0].label, ROOT_LABEL);
    }

    #[test]
    fn serializes_ids_as_tokens() {
        let txs = vec![tx("Auto:Gas", 100)];
        let graph = build_graph(&txs, &GroupedTopCategories::default(), &HiddenGroupStore::new());
        let node = &graph.nodes()[2];
        assert_eq!(node.id.to_string(), "2:Auto::Gas");
    }
}

pub mod graph;
pub mod grouping;
pub mod hidden;
pub mod money;
pub mod transaction;

pub use graph::{build_graph, Graph, GraphBuilder, GraphLink, GraphNode, NodeId, OTHER_SEGMENT, ROOT_LABEL};
pub use grouping::{group_top_categories, top_level_totals, GroupedTopCategories};
pub use hidden::{count_matching, HiddenGroup, HiddenGroupEntry, HiddenGroupStore, HideOutcome, OTHER_KEY};
pub use money::Money;
pub use transaction::{parse_category_path, Transaction, UNCATEGORIZED};

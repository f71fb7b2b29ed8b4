//! Least-filled chunk placement.

use scatter_core::NodeStat;
use thiserror::Error;

/// Placement errors.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("no nodes registered")]
    NoNodes,
}

/// Select `count` nodes to receive the chunks of one file, preferring the
/// nodes with the least total data.
///
/// The returned sequence always has length exactly `count`. When fewer than
/// `count` nodes are known, the nodes are repeated cyclically in the same
/// ascending order, so one node may receive more than one chunk of the same
/// file.
pub fn select_least_filled(
    stats: &[NodeStat],
    count: u32,
) -> Result<Vec<NodeStat>, PlacementError> {
    if stats.is_empty() {
        return Err(PlacementError::NoNodes);
    }

    let mut nodes = stats.to_vec();
    nodes.sort_by_key(|stat| stat.total_size);

    let count = count as usize;
    if nodes.len() >= count {
        nodes.truncate(count);
        return Ok(nodes);
    }

    Ok(nodes.iter().cycle().take(count).cloned().collect())
}

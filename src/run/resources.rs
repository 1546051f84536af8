//! Resources shared by the CLI commands.

use std::sync::Arc;

use crate::harvest::Harvester;
use crate::storage::SqliteSink;

/// Everything `harvest` and `serve` need once initialization is done.
pub(super) struct HarvestResources {
    /// Engine wired to the hickory resolver and the SQLite sink
    pub harvester: Arc<Harvester>,
    /// The same SQLite sink, also used for batch bookkeeping
    pub sink: SqliteSink,
}

pub struct Icons;

impl Icons {
    pub const SENSOR: &str = "🔭";
    pub const SEARCH: &str = "🔍";
    pub const CROSS: &str = "❌";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const AGGRESSOR: &str = "🔴";
    pub const VICTIM: &str = "🟠";
    pub const GRID: &str = "🔲";
    pub const EMPTY: &str = "∅";
}

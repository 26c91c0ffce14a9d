pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, section, summary_row, table_or_empty};
pub use table::{matrix_table, results_table, segments_table, sensors_table, stats_table, TableBuilder};
pub use theme::{paint, theme, Role, Theme};

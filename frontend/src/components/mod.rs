pub mod batch_table;
pub mod header;
pub mod history_panel;
pub mod pie_chart;
pub mod prediction;
pub mod theme_toggle;

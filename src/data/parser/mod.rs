pub mod alarm_log;
pub mod axis_log;
pub mod energy;
pub mod keyence;
pub mod tool_change;
pub mod trace_files;

// Re-export commonly used items
pub use alarm_log::load_alarm_log;
pub use axis_log::load_axis_log;
pub use energy::{energy_files, load_all_energy};
pub use tool_change::{extract_tool_changes, TOOL_CHANGE_ERROR_CODE};
pub use trace_files::scan_trace_folder;

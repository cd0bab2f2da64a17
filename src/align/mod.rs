pub mod asof;
pub mod density;
pub mod expand;
pub mod interval;
pub mod matcher;
pub mod relative;

// Re-export commonly used items
pub use asof::{merge_asof, AsofDirection};
pub use density::density;
pub use expand::{expand_neighbors, Matched};
pub use interval::detect_gaps;
pub use matcher::assign_backward;
pub use relative::project_relative;

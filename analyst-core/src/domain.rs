pub mod ids;
pub mod task;
pub mod question;
pub mod dataset;
pub mod answer;

pub use ids::*;
pub use task::*;
pub use question::*;
pub use dataset::*;
pub use answer::*;

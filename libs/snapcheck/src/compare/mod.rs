mod types;
mod utils;

pub use types::CompareOptions;
pub use types::ComparisonResult;
pub use types::DiffArtifacts;
pub use types::DiffStatistics;
pub use utils::compare;
pub use utils::compare_relaxed;
pub use utils::compare_strict;

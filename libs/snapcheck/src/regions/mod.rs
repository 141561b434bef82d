mod types;
mod utils;

pub use types::BoundingBox;
pub use types::ClassifiedRegion;
pub use types::LabelImage;
pub use types::Region;
pub use types::SeverityTier;
pub use utils::classify;
pub use utils::extract;
pub use utils::extract_labeled;
pub use utils::label_mask;

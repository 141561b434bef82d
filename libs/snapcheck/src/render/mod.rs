mod types;
mod utils;

pub use types::BaseImage;
pub use types::Color;
pub use types::DiffMode;
pub use types::HighlightMode;
pub use types::RenderConfig;
pub use types::TimestampCorner;
pub use utils::render_diff;

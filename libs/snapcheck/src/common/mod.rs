mod types;
mod utils;

pub use types::CompareError;
pub use types::CompareResult;
pub use types::ImageSource;
pub use utils::get_current_timestamp_str;
pub use utils::load_image;
pub use utils::suggested_diff_filename;

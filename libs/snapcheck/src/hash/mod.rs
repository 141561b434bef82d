mod types;
mod utils;

pub use types::Fingerprint;
pub use types::HashAlgorithm;
pub use utils::distance;
pub use utils::fingerprint;

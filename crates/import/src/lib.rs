pub mod adapters;
pub mod encoding;
pub mod normalize;
pub mod scanner;

pub use adapters::{parse_raw, FormatError, RawRecord};
pub use normalize::{normalize, DATE_OFFSET_MINUTES};
pub use scanner::{scan_root, DiscoveryError, SourceFile};

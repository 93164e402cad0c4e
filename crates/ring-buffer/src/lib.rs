//! Rolling Windows
//!
//! Fixed-capacity buffers holding the last N per-frame samples. Pushing into a
//! full window evicts the oldest sample in O(1).

mod buffer;
mod flags;

pub use buffer::RollingWindow;
pub use flags::FlagWindow;

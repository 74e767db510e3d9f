pub mod base;
pub mod buffers;
pub mod logging;
pub mod loopback;

pub use base::*;
pub use buffers::*;
pub use logging::*;
pub use loopback::*;

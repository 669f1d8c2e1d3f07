pub mod gps;
pub mod helpers;
pub mod klv;
pub mod main;
pub mod stream;

pub use gps::*;
pub use klv::*;
pub use main::*;
pub use stream::*;

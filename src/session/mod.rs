//! Session context
//!
//! Everything one running instance needs, owned by one value instead of
//! module-level state. Several contexts may share a data directory (and a
//! [`crate::bus::ChannelHub`] when they live in the same process).

mod context;
mod view;

pub use context::CouloirContext;
pub use view::{classify_point_data, ClassifiedPoint, ClassifiedView};

//! Relay side of the watcher: the Apps Script webhook sink, the
//! badge/notification surface, and the paced delivery loop that walks
//! extracted rows in order.

pub mod deliver;
pub mod sink;
pub mod surface;

pub use deliver::deliver_all;
pub use sink::AppsScriptSink;
pub use surface::DesktopSurface;

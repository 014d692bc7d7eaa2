pub mod clash;

pub use clash::{render_proxy, ClashProxy, CommonProxyOptions, RenderError};

pub mod color;
pub mod html;

pub use color::{ColorScale, YL_GN_6};
pub use html::{render_map, write_html};

pub mod footer;
pub mod header;
pub mod utils;

pub use footer::{draw_footer, StatusMessage};
pub use header::draw_header;
pub use utils::{bar, experience_color, remote_type_color, truncate};

mod command_input;
mod filter_field_picker;
mod input;
mod key_result;
mod pagination;
mod prompt_input;
mod query_panel;

pub use command_input::{CommandEvent, CommandInput};
pub use filter_field_picker::{FilterField, FilterFieldPicker, FilterPickerEvent};
pub use key_result::KeyResult;
pub use pagination::Pagination;
pub use prompt_input::{PromptEvent, PromptInput};
pub use query_panel::{panel_block, panel_status, render_panel, PanelStatus};

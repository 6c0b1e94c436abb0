mod banner;
mod command_input;
mod confirm;
mod input;
mod key_result;
mod search_input;

pub use banner::{Banner, BannerKind};
pub use command_input::{CommandEvent, CommandInput};
pub use confirm::{answer, ConfirmDialog, ConfirmEvent};
pub use input::TextInput;
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};

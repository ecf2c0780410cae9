pub mod completions;
pub mod configure;
pub mod session;
pub mod status;

pub use completions::CompletionsCommand;
pub use configure::ConfigureCommand;
pub use session::SessionCommand;
pub use status::StatusCommand;

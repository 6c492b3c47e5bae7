mod command_input;
mod input;
mod panels;

pub use command_input::{CommandEvent, CommandInput};
pub use panels::{render_error_panel, render_skeleton};

/// Outcome of offering a key event to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, nothing for the parent to do
  Handled,
  /// Key was consumed and produced an event for the parent
  Event(T),
  /// Key was not consumed, parent should try the next handler
  NotHandled,
}

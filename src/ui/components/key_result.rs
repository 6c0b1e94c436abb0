/// What a component did with a key.
///
/// Views try their components in order (dialog, search, palette) and only
/// fall through to their own bindings on `NotHandled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, and the parent should act on this
  Event(T),
  /// Not for this component
  NotHandled,
}

//! Markup and scripts embedded into chemlink's output.

/// Markup emitted in place of each structure-file link.
pub const EMBED_TEMPLATE: &str = include_str!("../templates/embed.html");

/// Markup emitted when a structure file cannot be shown.
pub const PLACEHOLDER_TEMPLATE: &str =
  include_str!("../templates/placeholder.html");

/// Fullscreen shim loaded once per page that contains a viewer.
pub const BIGSCREEN_JS: &str = include_str!("../templates/bigscreen.js");

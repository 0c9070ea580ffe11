//! Configuration section definitions.
//!
//! Each module corresponds to a section in `frontline.toml`:
//!
//! | Module   | TOML Section          | Purpose                          |
//! |----------|-----------------------|----------------------------------|
//! | `serve`  | `[serve]`             | Development server               |
//! | `watch`  | `[watch]`             | Debounce and rebuild cooldown    |
//! | `assets` | `[css]`, `[images]`   | Prefix targets, JPEG quality     |

mod assets;
mod serve;
mod watch;

pub use assets::{CssConfig, ImagesConfig};
pub use serve::ServeConfig;
pub use watch::WatchConfig;

//! Per-file transforms used by the leaf tasks.
//!
//! Each transform is a plain function from input bytes (or an input path) to
//! output bytes. Errors are returned as messages; the calling task attaches
//! the file path and decides whether to stop.
//!
//! | Module    | Library      | Used by                          |
//! |-----------|--------------|----------------------------------|
//! | `files`   | std          | cleaning, html, font, images     |
//! | `include` | serde_json   | processHtml, layoutProcessHtml   |
//! | `scss`    | grass        | css                              |
//! | `css`     | lightningcss | css                              |
//! | `image`   | image        | images                           |
//! | `svg`     | quick-xml    | svg                              |

pub mod css;
pub mod files;
pub mod image;
pub mod include;
pub mod scss;
pub mod svg;

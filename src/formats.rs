//! Output formats for highlight results
//!
//! - `html`: `<span>`-wrapped markup, the format every result carries in `value`
//! - `json`: the token tree and result metadata as JSON
//! - `treeviz`: one line per node, for eyeballing what a grammar matched
//!
//! Formats are looked up by name through [`FormatRegistry`].

pub mod html;
pub mod json;
pub mod registry;
pub mod treeviz;

pub use html::{escape_html, fix_markup, render_html, HtmlFormatter};
pub use json::{to_json_value, JsonFormatter};
pub use registry::{FormatError, FormatRegistry, Formatter};
pub use treeviz::{to_treeviz_str, TreevizFormatter};

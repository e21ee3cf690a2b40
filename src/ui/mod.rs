pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, hint, info, kv, muted, section, success, warn};
pub use table::{TableBuilder, rows_table};
pub use theme::{Theme, theme};

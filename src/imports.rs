pub use ::anyhow::{anyhow, bail, ensure, Context, Result};
pub use ::log::{debug, error, info, warn};
pub use ::once_cell::sync::{Lazy, OnceCell};
pub use ::regex::Regex;
pub use ::std::fs;
pub use ::std::path::{Path, PathBuf};
pub use ::time::macros::format_description;
pub use ::time::{Date, OffsetDateTime, Time};
pub use ::time_tz::{timezones, OffsetDateTimeExt};

//! Reading met files and the weather math built on them.

pub mod columns;
pub mod constants;
pub mod file;
pub mod reader;
pub mod record;
pub mod utilities;

pub use columns::{ColumnIndexMap, MetField, Resolution};
pub use constants::{Constant, ConstantsTable};
pub use file::{MetFile, MetRow};
pub use reader::{MetDataReader, MetSource};
pub use record::DailyRecord;

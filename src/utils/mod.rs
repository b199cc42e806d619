pub mod month_year;

pub use month_year::{format_month_year, last_day_of_month, parse_month_year};

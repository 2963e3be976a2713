pub(crate) mod date;
pub(crate) mod logging;

pub(crate) use date::{
    format_day, month_start, parse_date, parse_day_key, previous_day, week_start,
};
pub(crate) use logging::init_logging;

use flexi_logger::{DeferredNow, style};
use log::{Level, Record};

/// `LEVEL message`, with the level coloured. Debug and trace lines also carry
/// the module path.
pub fn cli_format(
    w: &mut dyn std::io::Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    match level {
        Level::Debug | Level::Trace => write!(
            w,
            "{} [{}] {}",
            style(level).paint(level.to_string()),
            record.module_path().unwrap_or("<unnamed>"),
            record.args()
        ),
        _ => write!(
            w,
            "{} {}",
            style(level).paint(level.to_string()),
            record.args()
        ),
    }
}

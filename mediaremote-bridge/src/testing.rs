use std::sync::Once;

use log::LevelFilter;
use log4rs::Config;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

static INIT: Once = Once::new();

/// Initializes the console logger once for the whole test binary.
pub fn init_logger() {
    init_logger_level(LevelFilter::Trace)
}

pub fn init_logger_level(level: LevelFilter) {
    INIT.call_once(|| {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "\x1B[37m{d(%H:%M:%S%.3f)}\x1B[0m {h({l:>5.5})} \x1B[36m{t:<40.40}\x1B[0m \x1B[37m:\x1B[0m {m}{n}",
            )))
            .build();

        let config = Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(level))
            .unwrap();

        log4rs::init_config(config).unwrap();
    })
}

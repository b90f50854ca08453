//! Logging macros capturing the call site
//!
//! These forward to [`Logger::log_located`](crate::core::Logger::log_located)
//! with `file!()` and `line!()`, so `%(filename)s` and `%(lineno)d` render
//! the real call site instead of a location inside this crate.

/// Log at an explicit level with call-site location
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_located($level, format!($($arg)+), file!(), line!())
    };
}

/// Log a debug message with call-site location
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Debug, $($arg)+)
    };
}

/// Log an info message with call-site location
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Info, $($arg)+)
    };
}

/// Log a warning message with call-site location
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Warning, $($arg)+)
    };
}

/// Log an error message with call-site location
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Error, $($arg)+)
    };
}

/// Log a critical message with call-site location
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Critical, $($arg)+)
    };
}

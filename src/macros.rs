/// Location of the macro call site, including module path and enclosing
/// function.
#[macro_export]
macro_rules! here {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        $crate::Location::new(
            ::core::file!(),
            ::core::line!(),
            ::core::module_path!(),
            $crate::event::function_name(type_name_of(f)),
        )
    }};
}

/// Log a `format!`-style message through a [`Logger`](crate::Logger).
///
/// ```no_run
/// # use debug_log::{log, Level, Logger};
/// let logger = Logger::new();
/// log!(logger, Level::Warn, "retrying {} more times", 3);
/// log!(logger, Level::Info, tags: ["db", "pool"], "pool size {}", 8);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, tags: [$($tag:expr),* $(,)?], $($arg:tt)+) => {
        $logger.log_at(
            $crate::here!(),
            ::std::format!($($arg)+),
            $crate::LogOptions::level($level)$(.tag($tag))*,
        )
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_at(
            $crate::here!(),
            ::std::format!($($arg)+),
            $crate::LogOptions::level($level),
        )
    };
}

/// Log variables as `name=value` pairs at DEBUG level, in the order given.
///
/// ```no_run
/// # use debug_log::{watch, Logger};
/// let logger = Logger::new();
/// let counter = 10;
/// let user = "Bob";
/// watch!(logger, counter, user);
/// watch!(logger, counter = counter * 2, user = user);
/// watch!(logger, name = "loop"; counter = counter);
/// ```
#[macro_export]
macro_rules! watch {
    ($logger:expr, name = $name:expr; $($key:ident = $value:expr),+ $(,)?) => {
        $logger.watch_at(
            $crate::here!(),
            ::core::option::Option::Some($name),
            &[$((::core::stringify!($key), &$value as &dyn ::core::fmt::Debug)),+],
        )
    };
    ($logger:expr, $($key:ident = $value:expr),+ $(,)?) => {
        $logger.watch_at(
            $crate::here!(),
            ::core::option::Option::None,
            &[$((::core::stringify!($key), &$value as &dyn ::core::fmt::Debug)),+],
        )
    };
    ($logger:expr, $($var:ident),+ $(,)?) => {
        $logger.watch_at(
            $crate::here!(),
            ::core::option::Option::None,
            &[$((::core::stringify!($var), &$var as &dyn ::core::fmt::Debug)),+],
        )
    };
}

/// Like `assert!`, but the failure is logged at ERROR level (with a stack
/// trace) before panicking.
#[macro_export]
macro_rules! assert_log {
    ($logger:expr, $cond:expr $(,)?) => {
        if let ::core::result::Result::Err(failure) =
            $logger.assert_log_at($crate::here!(), $cond, ::core::stringify!($cond))
        {
            ::core::panic!("{}", failure);
        }
    };
    ($logger:expr, $cond:expr, $($arg:tt)+) => {
        if let ::core::result::Result::Err(failure) =
            $logger.assert_log_at($crate::here!(), $cond, ::std::format!($($arg)+))
        {
            ::core::panic!("{}", failure);
        }
    };
}

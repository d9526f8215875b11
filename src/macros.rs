// Writes a single line to anything implementing `Logger`. Writing is best
// effort: a logger without a writer, or a failing writer, drops the line.
#[cfg(not(feature = "no_logging"))]
macro_rules! log {
    ($logger:expr, $($arg:tt)*) => {{
        if let Some(w) = $logger.line_writer() {
            let _ = std::io::Write::write_fmt(w, format_args!("{}\n", format_args!($($arg)*)));
        }
    }};
}
#[cfg(feature = "no_logging")]
macro_rules! log {
    ($logger:expr, $($arg:tt)*) => {{
        let _ = &$logger;
    }};
}

// Developer tracing. The first argument is a literal `true`/`false` so a
// module can switch its own tracing on without touching the others.
macro_rules! enabled_debug_print {
    (false, $name:literal, $format:literal) => {};
    (false, $name:literal, $format:literal, $($args:expr),*) => {};
    (true, $name:literal, $format:literal) => {
        println!("[{}] {}", $name, $format)
    };
    (true, $name:literal, $format:literal, $($args:expr),*) => {
        println!("[{}] {}", $name, &format!($format, $($args),*))
    };
}

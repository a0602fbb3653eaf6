/// Captures the current source location as a [`crate::SourceLocation`].
#[macro_export]
macro_rules! dc_source {
    () => {
        $crate::SourceLocation::new(file!(), line!())
    };
}

/// Builds an error [`crate::Message`] with the call-site source location
/// attached.
#[macro_export]
macro_rules! dc_error {
    ($text:expr $(,)?) => {{
        $crate::Message::error($text).with_source($crate::dc_source!())
    }};
    ($fmt:expr, $($arg:tt)+) => {{
        $crate::Message::error(format!($fmt, $($arg)+)).with_source($crate::dc_source!())
    }};
}

/// Builds a warning [`crate::Message`] with the call-site source location
/// attached.
#[macro_export]
macro_rules! dc_warning {
    ($text:expr $(,)?) => {{
        $crate::Message::warning($text).with_source($crate::dc_source!())
    }};
    ($fmt:expr, $($arg:tt)+) => {{
        $crate::Message::warning(format!($fmt, $($arg)+)).with_source($crate::dc_source!())
    }};
}

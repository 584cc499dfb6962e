/// Records a formatted event through the global recorder.
///
/// Arguments are converted with `TraceArg::from`, a string argument is
/// interned only when its position in the format is a `%s`.
///
/// # Examples
/// ```
/// use trcstream_recorder::trace_printf;
///
/// // without an installed recorder nothing is recorded
/// trace_printf!("motor %s at %d rpm", "left", 1200_i32).unwrap();
/// ```
#[macro_export]
macro_rules! trace_printf {
    (channel: $channel:expr, $format:expr $(, $arg:expr)* $(,)?) => {
        $crate::dispatch::printf_channel(
            $channel,
            $format,
            &[$($crate::args::TraceArg::from($arg)),*],
        )
    };
    ($format:expr $(, $arg:expr)* $(,)?) => {
        $crate::dispatch::printf($format, &[$($crate::args::TraceArg::from($arg)),*])
    };
}

//! Single pass scan of printf-style format strings
//!
//! The scan only needs to know how many 32-bit words to pull from the
//! argument list and which of them are strings to intern. The conversion
//! character is always the byte immediately following the `%`.

/// maximum number of argument slots in one event
pub const MAX_ARGS: usize = 16;

/// maximum number of format bytes scanned and recorded in one event
pub const MAX_FORMAT_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatScan {
    /// number of slots to encode, capped at [`MAX_ARGS`]
    pub args_len: usize,
    /// number of conversion specifiers found before capping
    pub requested_args: usize,
    pub string_args: [bool; MAX_ARGS],
    /// number of format bytes to record, capped at [`MAX_FORMAT_LEN`]
    pub fmt_len: usize,
}

impl FormatScan {
    pub fn is_string_arg(&self, index: usize) -> bool {
        index < self.args_len && self.string_args[index]
    }

    pub fn is_truncated(&self) -> bool {
        self.requested_args > self.args_len
    }
}

/// Scans at most [`MAX_FORMAT_LEN`] bytes of `format`, stopping early at the
/// end of the string or at the first nul byte.
pub fn scan_format(format: &str) -> FormatScan {
    let bytes = format.as_bytes();
    let byte_at = |i: usize| -> u8 {
        if i < MAX_FORMAT_LEN {
            bytes.get(i).copied().unwrap_or(0)
        } else {
            0
        }
    };

    let mut string_args = [false; MAX_ARGS];
    let mut requested_args = 0;
    let mut i = 0;
    while byte_at(i) != 0 {
        if byte_at(i) == b'%' {
            match byte_at(i + 1) {
                0 => {
                    // lone '%' at the end of the scanned window
                    i += 1;
                    break;
                }
                b'%' => {}
                conversion => {
                    if conversion == b's' && requested_args < MAX_ARGS {
                        string_args[requested_args] = true;
                    }
                    requested_args += 1;
                }
            }
            i += 2;
            continue;
        }
        i += 1;
    }

    FormatScan {
        args_len: requested_args.min(MAX_ARGS),
        requested_args,
        string_args,
        fmt_len: i.min(MAX_FORMAT_LEN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_specifiers() {
        let scan = scan_format("int %d, unsigned %u");
        assert_eq!(scan.args_len, 2);
        assert_eq!(scan.fmt_len, "int %d, unsigned %u".len());
        assert!(!scan.is_string_arg(0));
        assert!(!scan.is_string_arg(1));
        assert!(!scan.is_truncated());
    }

    #[test]
    fn test_escaped_percent() {
        let scan = scan_format("100%% done");
        assert_eq!(scan.args_len, 0);
        assert_eq!(scan.fmt_len, 10);

        let scan = scan_format("%%s %s");
        assert_eq!(scan.args_len, 1);
        assert!(scan.is_string_arg(0));
    }

    #[test]
    fn test_trailing_percent() {
        let scan = scan_format("value %d %");
        assert_eq!(scan.args_len, 1);
        assert_eq!(scan.fmt_len, 10);

        let scan = scan_format("%");
        assert_eq!(scan.args_len, 0);
        assert_eq!(scan.fmt_len, 1);
    }

    #[test]
    fn test_string_flags() {
        let scan = scan_format("%s=%d (%s)");
        assert_eq!(scan.args_len, 3);
        assert_eq!(
            (0..3).map(|i| scan.is_string_arg(i)).collect::<Vec<_>>(),
            vec![true, false, true]
        );
        // width makes the conversion character a digit, not a string
        assert!(!scan_format("%10s").is_string_arg(0));
    }

    #[test]
    fn test_truncated_arguments() {
        let format = "%d ".repeat(19) + "%s";
        let scan = scan_format(&format);
        assert_eq!(scan.requested_args, 20);
        assert_eq!(scan.args_len, MAX_ARGS);
        assert!(scan.is_truncated());
        // the string specifier beyond the cap is never flagged
        assert!(scan.string_args.iter().all(|flag| !flag));
    }

    #[test]
    fn test_format_length_cap() {
        let long = "x".repeat(300);
        assert_eq!(scan_format(&long).fmt_len, MAX_FORMAT_LEN);
        let exact = "y".repeat(MAX_FORMAT_LEN);
        assert_eq!(scan_format(&exact).fmt_len, MAX_FORMAT_LEN);

        // specifier straddling the end of the window is not counted
        let straddling = "z".repeat(MAX_FORMAT_LEN - 1) + "%d";
        let scan = scan_format(&straddling);
        assert_eq!(scan.args_len, 0);
        assert_eq!(scan.fmt_len, MAX_FORMAT_LEN);

        let last_fits = "z".repeat(MAX_FORMAT_LEN - 2) + "%d tail";
        let scan = scan_format(&last_fits);
        assert_eq!(scan.args_len, 1);
        assert_eq!(scan.fmt_len, MAX_FORMAT_LEN);
    }

    #[test]
    fn test_nul_terminates() {
        let scan = scan_format("a %d\0 %d");
        assert_eq!(scan.args_len, 1);
        assert_eq!(scan.fmt_len, 4);
    }
}

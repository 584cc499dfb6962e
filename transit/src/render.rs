//! Turns a decoded format string and its slots back into text.
//!
//! Each conversion consumes one 32-bit slot. Flags, width and precision are
//! accepted but not applied. Conversions left without a slot, because the
//! encoder truncated the argument list, are copied verbatim.
use crate::{Argument, SymbolLookup};
use std::fmt::Write;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub args: Vec<Argument>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Length {
    Default,
    Short,
    Byte,
    Long,
}

pub fn render(format: &[u8], slots: &[u32], symbols: &dyn SymbolLookup) -> Rendered {
    let format = String::from_utf8_lossy(format);
    let mut chars = format.chars().peekable();
    let mut slots = slots.iter();
    let mut text = String::with_capacity(format.len());
    let mut args = Vec::new();

    while let Some(c) = chars.next() {
        if c != '%' {
            text.push(c);
            continue;
        }
        match chars.peek() {
            None => {
                text.push('%');
                break;
            }
            Some('%') => {
                chars.next();
                text.push('%');
                continue;
            }
            Some(_) => {}
        }

        let mut specifier = String::from("%");
        let length = read_modifiers(&mut chars, &mut specifier);
        let Some(conversion) = chars.next() else {
            text.push_str(&specifier);
            break;
        };
        specifier.push(conversion);
        let Some(&word) = slots.next() else {
            text.push_str(&specifier);
            continue;
        };

        let arg = to_argument(conversion, length, word, symbols);
        match (&arg, conversion) {
            (Argument::Hex(v), 'X') => {
                let _ = write!(text, "{v:X}");
            }
            (Argument::Hex(v), 'o') => {
                let _ = write!(text, "{v:o}");
            }
            _ => {
                let _ = write!(text, "{arg}");
            }
        }
        args.push(arg);
    }

    Rendered { text, args }
}

fn read_modifiers(chars: &mut Peekable<Chars<'_>>, specifier: &mut String) -> Length {
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() || matches!(c, '-' | '+' | ' ' | '#' | '.') {
            specifier.push(c);
            chars.next();
        } else {
            break;
        }
    }
    let mut length = Length::Default;
    while let Some(&c) = chars.peek() {
        length = match (c, length) {
            ('h', Length::Short) => Length::Byte,
            ('h', _) => Length::Short,
            ('b', _) => Length::Byte,
            ('l', _) => Length::Long,
            _ => break,
        };
        specifier.push(c);
        chars.next();
    }
    length
}

fn to_argument(conversion: char, length: Length, word: u32, symbols: &dyn SymbolLookup) -> Argument {
    match conversion {
        'd' | 'i' => match length {
            Length::Short => Argument::I16(word as i16),
            Length::Byte => Argument::I8(word as i8),
            Length::Default | Length::Long => Argument::I32(word as i32),
        },
        'u' => match length {
            Length::Short => Argument::U16(word as u16),
            Length::Byte => Argument::U8(word as u8),
            Length::Default | Length::Long => Argument::U32(word),
        },
        'x' | 'X' | 'o' => Argument::Hex(word),
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' => Argument::F32(f32::from_bits(word)),
        'c' => Argument::Char(char::from_u32(word).unwrap_or(char::REPLACEMENT_CHARACTER)),
        'p' => Argument::Pointer(word),
        's' => match word {
            0 => Argument::UnresolvedSymbol(0),
            handle => symbols
                .symbol(handle)
                .map_or(Argument::UnresolvedSymbol(handle), Argument::String),
        },
        other => {
            log::warn!("unsupported conversion specifier '{other}', rendering as unsigned");
            Argument::U32(word)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_symbols() -> HashMap<u32, String> {
        HashMap::new()
    }

    #[test]
    fn test_render_numbers() {
        let out = render(b"int %d, unsigned %u", &[(-2_i32) as u32, 32], &no_symbols());
        assert_eq!(out.text, "int -2, unsigned 32");
        assert_eq!(out.args, vec![Argument::I32(-2), Argument::U32(32)]);
    }

    #[test]
    fn test_render_length_modifiers() {
        let out = render(
            b"%hd %hhu %bd %lu %x %X %c",
            &[(-25_i32) as u32, 0x1FF, (-4_i32) as u32, 7, 0xbeef, 0xbeef, 'z' as u32],
            &no_symbols(),
        );
        assert_eq!(out.text, "-25 255 -4 7 beef BEEF z");
        assert_eq!(out.args[0], Argument::I16(-25));
        assert_eq!(out.args[1], Argument::U8(255));
        assert_eq!(out.args[2], Argument::I8(-4));
    }

    #[test]
    fn test_render_float_and_width() {
        let out = render(b"t=%5.2f", &[1.5_f32.to_bits()], &no_symbols());
        assert_eq!(out.text, "t=1.5");
        assert_eq!(out.args, vec![Argument::F32(1.5)]);
    }

    #[test]
    fn test_render_symbols() {
        let mut symbols = HashMap::new();
        symbols.insert(7_u32, String::from("motor"));
        let out = render(b"[%s] [%s] [%s]", &[7, 0, 9], &symbols);
        assert_eq!(out.text, "[motor] [<unresolved>] [<symbol 0x9>]");
        assert!(out.args.iter().all(Argument::is_symbol));
    }

    #[test]
    fn test_render_escapes_and_truncation() {
        let out = render(b"100%% done %", &[], &no_symbols());
        assert_eq!(out.text, "100% done %");
        assert!(out.args.is_empty());

        // third specifier was truncated by the encoder
        let out = render(b"%u %u %u", &[1, 2], &no_symbols());
        assert_eq!(out.text, "1 2 %u");
        assert_eq!(out.args.len(), 2);
    }
}

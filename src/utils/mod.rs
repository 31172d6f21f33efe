pub mod styles;

pub use styles::*;

pub fn warn(mesg: &str) {
    eprintln!("{}", mesg.warn());
}

/// writeln! for output that has nowhere to report errors to, e.g. stdout in the repl.
macro_rules! uwriteln {
    ($out:expr) => {{
        let _ = writeln!($out);
    }};
    ($out:expr, $($arg:tt)*) => {{
        let _ = writeln!($out, $($arg)*);
    }};
}
pub(crate) use uwriteln;

/// Remove escape sequences from the string (e.g. for colors).
#[cfg(test)]
pub fn strip_escapes(s: &str) -> String {
    // Even with Style::empty() the tabled crate will add escape sequences to the end of
    // lines to reset all modes so it's simpler to strip them than to turn styling off.
    let mut result = String::with_capacity(s.len());
    let mut escaping = false;

    // Note that escape sequences can be fairly gnarly, e.g. for RGB colors.
    // See https://gist.github.com/fnky/458719343aabd01cfb17a3a4f7296797
    for c in s.chars() {
        if c == '\x1b' {
            escaping = true;
        } else if escaping {
            if c == 'm' {
                escaping = false;
            }
        } else {
            result.push(c);
        }
    }
    result
}

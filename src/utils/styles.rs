//! Used to color and otherwise style various bits of output.
use nu_ansi_term::{AnsiString, Color, Style};

pub trait Styling {
    fn explain_title(self) -> AnsiString<'static>;
    fn explain_text(self) -> AnsiString<'static>;
    fn table_header(self) -> AnsiString<'static>;
    fn table_sep(self) -> AnsiString<'static>;
    fn table_field(self) -> AnsiString<'static>;
    fn die_offset(self) -> AnsiString<'static>;
    fn die_tag(self) -> AnsiString<'static>;
    fn die_attr(self) -> AnsiString<'static>;
    fn warn(self) -> AnsiString<'static>;
}

impl Styling for String {
    fn explain_title(self) -> AnsiString<'static> {
        Style::new().bold().paint(self)
    }

    fn explain_text(self) -> AnsiString<'static> {
        Style::new().paint(self)
    }

    fn table_header(self) -> AnsiString<'static> {
        Style::new().bold().paint(self)
    }

    fn table_sep(self) -> AnsiString<'static> {
        Color::DarkGray.paint(self)
    }

    fn table_field(self) -> AnsiString<'static> {
        Style::new().paint(self)
    }

    fn die_offset(self) -> AnsiString<'static> {
        Color::DarkGray.paint(self)
    }

    fn die_tag(self) -> AnsiString<'static> {
        Color::Blue.bold().paint(self)
    }

    fn die_attr(self) -> AnsiString<'static> {
        Color::Cyan.paint(self)
    }

    fn warn(self) -> AnsiString<'static> {
        Color::Red.paint(self)
    }
}

impl Styling for &str {
    fn explain_title(self) -> AnsiString<'static> {
        self.to_string().explain_title()
    }

    fn explain_text(self) -> AnsiString<'static> {
        self.to_string().explain_text()
    }

    fn table_header(self) -> AnsiString<'static> {
        self.to_string().table_header()
    }

    fn table_sep(self) -> AnsiString<'static> {
        self.to_string().table_sep()
    }

    fn table_field(self) -> AnsiString<'static> {
        self.to_string().table_field()
    }

    fn die_offset(self) -> AnsiString<'static> {
        self.to_string().die_offset()
    }

    fn die_tag(self) -> AnsiString<'static> {
        self.to_string().die_tag()
    }

    fn die_attr(self) -> AnsiString<'static> {
        self.to_string().die_attr()
    }

    fn warn(self) -> AnsiString<'static> {
        self.to_string().warn()
    }
}

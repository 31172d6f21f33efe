use super::tables::{TableBuilder, add_field};
use crate::repl::{AbbrevsArgs, DieArgs, TableArgs, TreeArgs};
use crate::utils::{self, Styling, uwriteln};
use dinfo::debug::{CompilationUnit, DebugInfo, Die, Format};
use std::io::Write;

fn find_unit<'i, 'a>(info: &'i DebugInfo<'a>, index: usize) -> Option<&'i CompilationUnit<'a>> {
    let unit = info.unit(index);
    if unit.is_none() {
        match info.unit_count() {
            0 => utils::warn("there are no compilation units"),
            1 => utils::warn(&format!("there is no unit {index}, the only unit is 0")),
            n => utils::warn(&format!("there is no unit {index}, units are 0..{}", n - 1)),
        }
    }
    unit
}

fn format_name(format: Format) -> &'static str {
    match format {
        Format::Dwarf32 => "32-bit",
        Format::Dwarf64 => "64-bit",
    }
}

/// offset, tag, and name (if there is one)
fn die_summary(die: &Die) -> String {
    let mut s = format!(
        "{} {}",
        format!("0x{:x}", die.offset()).die_offset(),
        die.tag().to_string().die_tag()
    );
    if let Some(name) = die.name() {
        s.push(' ');
        s.push_str(name);
    }
    s
}

pub fn units(info: &DebugInfo, args: &TableArgs, mut out: impl Write) {
    if info.unit_count() == 0 {
        uwriteln!(out, "no compilation units");
        return;
    }

    let mut builder = TableBuilder::new();
    builder.add_col_r("index", "position of the unit within .debug_info.");
    builder.add_col_r(
        "offset",
        "offset of the unit header from the start of .debug_info.",
    );
    builder.add_col_r(
        "length",
        "size of the unit in bytes, not counting the length field.",
    );
    builder.add_col_r("version", "DWARF version the unit was written with.");
    builder.add_col_r("addr_size", "size of target addresses in bytes.");
    builder.add_col_r("abbrevs", "offset of the unit's table within .debug_abbrev.");
    builder.add_col_l("format", "32-bit or 64-bit DWARF, i.e. the size of section offsets.");
    builder.add_col_r("entries", "number of debugging information entries in the unit.");
    builder.add_col_l("tag", "tag of the unit's root entry.");
    builder.add_col_l("name", "name of the root entry, usually the primary source file.");

    for (i, unit) in info.units().enumerate() {
        add_field!(builder, "index", i);
        add_field!(builder, "offset", "{:x}", unit.offset());
        add_field!(builder, "length", "{:x}", unit.length());
        add_field!(builder, "version", unit.version());
        add_field!(builder, "addr_size", unit.address_size());
        add_field!(builder, "abbrevs", "{:x}", unit.abbreviation_offset());
        add_field!(builder, "format", format_name(unit.format()));
        add_field!(builder, "entries", unit.root().count());
        add_field!(builder, "tag", unit.root().tag());
        add_field!(builder, "name", unit.root().name().unwrap_or(""));
    }

    builder.writeln(out, args.titles, args.explain);
}

pub fn tree(info: &DebugInfo, args: &TreeArgs, mut out: impl Write) {
    let Some(unit) = find_unit(info, args.unit) else {
        return;
    };

    let max_depth = args.depth.unwrap_or(usize::MAX);
    unit.root().walk(|die, depth| {
        if depth > max_depth {
            return;
        }
        let indent = "   ".repeat(depth);
        uwriteln!(out, "{indent}{}", die_summary(die));
        if args.attrs {
            for (name, value) in die.attributes() {
                uwriteln!(out, "{indent}   {}: {value}", name.to_string().die_attr());
            }
        }
    });
}

pub fn die(info: &DebugInfo, args: &DieArgs, mut out: impl Write) {
    let found = usize::try_from(args.offset)
        .ok()
        .and_then(|offset| info.unit_containing(offset).zip(info.die_at_offset(offset)));
    let Some((unit, die)) = found else {
        utils::warn(&format!("there's no entry at 0x{:x}", args.offset));
        return;
    };

    uwriteln!(out, "{}", die_summary(die));
    for (name, value) in die.attributes() {
        uwriteln!(out, "   {}: {value}", name.to_string().die_attr());
        if args.resolve && value.is_reference() {
            match info.resolve(unit, value) {
                Some(target) => {
                    uwriteln!(out, "      => {}", die_summary(target));
                }
                None => {
                    uwriteln!(out, "      => {}", "unresolved".warn());
                }
            }
        }
    }
    if die.has_children() {
        uwriteln!(out, "{} children", die.children().len());
    }
    uwriteln!(out, "in the unit at 0x{:x}", unit.offset());
}

pub fn abbrevs(info: &DebugInfo, args: &AbbrevsArgs, out: impl Write) {
    let Some(unit) = find_unit(info, args.unit) else {
        return;
    };

    let mut builder = TableBuilder::new();
    builder.add_col_r("code", "code entries use to select the abbreviation.");
    builder.add_col_l("tag", "tag of entries that use the abbreviation.");
    builder.add_col_l("children", "whether those entries are followed by children.");
    builder.add_col_l("attributes", "attribute names and the forms their values are encoded with.");

    for abbrev in unit.abbreviations().iter() {
        let attrs: Vec<String> = abbrev
            .attrs
            .iter()
            .map(|a| format!("{}: {}", a.name, a.encoding))
            .collect();
        add_field!(builder, "code", abbrev.code);
        add_field!(builder, "tag", abbrev.tag);
        add_field!(builder, "children", if abbrev.has_children { "yes" } else { "no" });
        add_field!(builder, "attributes", attrs.join(", "));
    }

    builder.writeln(out, args.titles, args.explain);
}

pub fn errors(info: &DebugInfo, mut out: impl Write) {
    if info.errors().is_empty() {
        uwriteln!(out, "no errors");
        return;
    }
    for err in info.errors() {
        uwriteln!(out, "0x{:x}: {}", err.offset, err.error.to_string().warn());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::strip_escapes;
    use dinfo::debug::ParseOptions;

    #[rustfmt::skip]
    const ABBREV: &[u8] = &[
        1, 0x11, 1, 0x03, 0x0e, 0x13, 0x0b, 0, 0, // compile_unit: name strp, language data1
        2, 0x34, 0, 0x03, 0x08, 0x49, 0x13, 0, 0, // variable: name string, type ref4
        3, 0x24, 0, 0x03, 0x08, 0x0b, 0x0b, 0, 0, // base_type: name string, byte_size data1
        0,
    ];

    #[rustfmt::skip]
    const INFO: &[u8] = &[
        0x1b, 0, 0, 0, 4, 0, 0, 0, 0, 0, 8, // length, version, abbrevs, address size
        1, 0, 0, 0, 0, 0x0c,                // 0x0b hello.c
        2, b'x', 0, 0x18, 0, 0, 0,          // 0x11 x
        3, b'i', b'n', b't', 0, 4,          // 0x18 int
        0,
    ];

    const STRINGS: &[u8] = b"hello.c\0";

    fn run<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>),
    {
        let mut v: Vec<u8> = Vec::new();
        f(&mut v);
        strip_escapes(&String::from_utf8(v).unwrap())
    }

    fn info() -> DebugInfo<'static> {
        DebugInfo::new(INFO, ABBREV, STRINGS, &ParseOptions::default())
    }

    fn table_args(titles: bool) -> TableArgs {
        TableArgs {
            explain: false,
            titles,
        }
    }

    #[test]
    fn units_table() {
        let info = info();
        let s = run(|out| units(&info, &table_args(true), out));
        let rows: Vec<Vec<&str>> = s.lines().map(|l| l.split_whitespace().collect()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            vec![
                "index", "offset", "length", "version", "addr_size", "abbrevs", "format",
                "entries", "tag", "name"
            ]
        );
        assert!(rows[1].iter().all(|dashes| dashes.chars().all(|c| c == '-')));
        assert_eq!(
            rows[2],
            vec!["0", "0", "1b", "4", "8", "0", "32-bit", "3", "DW_TAG_compile_unit", "hello.c"]
        );
    }

    #[test]
    fn no_units() {
        let info = DebugInfo::new(&[], &[], &[], &ParseOptions::default());
        let s = run(|out| units(&info, &table_args(false), out));
        assert_eq!(s, "no compilation units\n");
    }

    #[test]
    fn whole_tree() {
        let info = info();
        let args = TreeArgs {
            unit: 0,
            depth: None,
            attrs: false,
        };
        let s = run(|out| tree(&info, &args, out));
        insta::assert_snapshot!(s, @r"
0xb DW_TAG_compile_unit hello.c
   0x11 DW_TAG_variable x
   0x18 DW_TAG_base_type int
");
    }

    #[test]
    fn shallow_tree_with_attributes() {
        let info = info();
        let args = TreeArgs {
            unit: 0,
            depth: Some(0),
            attrs: true,
        };
        let s = run(|out| tree(&info, &args, out));
        insta::assert_snapshot!(s, @r#"
0xb DW_TAG_compile_unit hello.c
   DW_AT_name: "hello.c"
   DW_AT_language: 12
"#);
    }

    #[test]
    fn missing_unit() {
        let info = info();
        let args = TreeArgs {
            unit: 3,
            depth: None,
            attrs: false,
        };
        assert_eq!(run(|out| tree(&info, &args, out)), "");
    }

    #[test]
    fn resolved_die() {
        let info = info();
        let args = DieArgs {
            offset: 0x11,
            resolve: true,
        };
        let s = run(|out| die(&info, &args, out));
        insta::assert_snapshot!(s, @r#"
0x11 DW_TAG_variable x
   DW_AT_name: "x"
   DW_AT_type: <unit+0x18>
      => 0x18 DW_TAG_base_type int
in the unit at 0x0
"#);
    }

    #[test]
    fn root_die() {
        let info = info();
        let args = DieArgs {
            offset: 0xb,
            resolve: false,
        };
        let s = run(|out| die(&info, &args, out));
        insta::assert_snapshot!(s, @r#"
0xb DW_TAG_compile_unit hello.c
   DW_AT_name: "hello.c"
   DW_AT_language: 12
2 children
in the unit at 0x0
"#);
    }

    #[test]
    fn no_die() {
        let info = info();
        let args = DieArgs {
            offset: 0x12, // inside x but not its start
            resolve: false,
        };
        assert_eq!(run(|out| die(&info, &args, out)), "");
    }

    #[test]
    fn abbreviation_table() {
        let info = info();
        let args = AbbrevsArgs {
            unit: 0,
            explain: false,
            titles: false,
        };
        let s = run(|out| abbrevs(&info, &args, out));
        let lines: Vec<&str> = s.lines().map(|l| l.trim_end()).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("DW_TAG_compile_unit"));
        assert!(lines[0].contains(" yes "));
        assert!(lines[0].ends_with("DW_AT_name: DW_FORM_strp, DW_AT_language: DW_FORM_data1"));
        assert!(lines[1].contains(" no "));
        assert!(lines[1].ends_with("DW_AT_name: DW_FORM_string, DW_AT_type: DW_FORM_ref4"));
        assert!(lines[2].trim_start().starts_with("3 "));
    }

    #[test]
    fn unit_errors() {
        let info = info();
        assert_eq!(run(|out| errors(&info, out)), "no errors\n");

        let mut bytes = INFO.to_vec();
        bytes.extend([7, 0, 0, 0, 5, 0, 0, 0, 0, 0, 8]); // DWARF 5
        let info = DebugInfo::new(&bytes, ABBREV, STRINGS, &ParseOptions::default());
        assert_eq!(info.unit_count(), 1);
        let s = run(|out| errors(&info, out));
        insta::assert_snapshot!(s, @"0x1f: unsupported DWARF version 5 at 0x1f");
    }
}

use super::tables::{TableBuilder, add_field};
use crate::repl::TableArgs;
use crate::utils::Styling;
use dinfo::elf::{ElfFile, SectionHeader};
use std::io::Write;

pub fn sections(file: &ElfFile, args: &TableArgs, out: impl Write) {
    let mut builder = TableBuilder::new();
    builder.add_col_r("index", "index into sections.");
    builder.add_col_l("name", "name from the section name string table.");
    builder.add_col_l("type", "type of the section.");
    builder.add_col_r("vaddr", "virtual address at execution.");
    builder.add_col_r(
        "offset",
        "offset into the ELF file for the start of the section.",
    );
    builder.add_col_r("size", "section size in bytes.");
    builder.add_col_r("entry_size", "set if the section holds a table of entries.");
    builder.add_col_r("align", "section alignment.");
    builder.add_col_r(
        "link",
        "link to another section with related information, usually a string or symbol table.",
    );
    builder.add_col_l("flags", "write, alloc, exec, etc.");

    // Would be kind of nice to sort these by name but they are referenced sometimes
    // by index...
    for (i, section) in file.sections().iter().enumerate() {
        add_field!(builder, "index", i);
        add_field!(builder, "name", file.section_name(i).unwrap_or(""));
        add_field!(builder, "type", section.stype);
        add_field!(builder, "vaddr", "{:x}", section.vbytes.start.0);
        add_field!(builder, "offset", "{:x}", section.obytes.start.0);
        add_field!(builder, "size", "{:x}", section.obytes.size);
        add_field!(builder, "entry_size", section.entry_size);
        add_field!(builder, "align", section.align);
        add_field!(builder, "link", section.link.0);
        add_field!(builder, "flags", SectionHeader::flags(section.flags));
    }

    builder.writeln(out, args.titles, args.explain);
}

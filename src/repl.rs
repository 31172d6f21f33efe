//! Definitions for the commands that are used interactively, e.g.
//! `units` and `tree 0`.
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about = "Inspect the DWARF debugging entries of an executable", long_about = None)]
#[command(infer_subcommands(true))] // allow abreviations
pub struct Repl {
    #[command(subcommand)]
    pub command: MainCommand,
}

#[derive(Subcommand)]
pub enum MainCommand {
    /// Show the abbreviation table used by a compilation unit
    Abbrevs(AbbrevsArgs),

    /// Show the entry at an offset into .debug_info
    Die(DieArgs),

    /// Show the units that couldn't be parsed
    Errors,

    /// Show the ELF section table
    Sections(TableArgs),

    /// Show the entries of a compilation unit as an indented tree
    Tree(TreeArgs),

    /// Show the compilation units
    Units(TableArgs),

    /// Exit dinfo
    Quit,
}

#[derive(Args)]
pub struct TableArgs {
    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,

    /// Add column headers
    #[arg(short, long)]
    pub titles: bool,
}

#[derive(Args)]
pub struct AbbrevsArgs {
    /// Index of the unit, see the units command
    pub unit: usize,

    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,

    /// Add column headers
    #[arg(short, long)]
    pub titles: bool,
}

#[derive(Args)]
pub struct DieArgs {
    /// Offset of the entry from the start of .debug_info
    #[arg(value_parser = parse_u64_expr)]
    pub offset: u64,

    /// Also show the entries that references point to
    #[arg(short, long)]
    pub resolve: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Index of the unit, see the units command
    pub unit: usize,

    /// Only show entries this deep, the unit's root is at depth zero
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Also show each entry's attributes
    #[arg(short, long)]
    pub attrs: bool,
}

// TODO this should parse at least simple expressions
fn parse_u64_expr(s: &str) -> Result<u64, String> {
    if s.starts_with("0x") {
        let t = s.trim_start_matches("0x");
        u64::from_str_radix(t, 16).map_err(|_| format!("`{s}` isn't a hex or decimal number"))
    } else {
        s.parse()
            .map_err(|_| format!("`{s}` isn't a hex or decimal number"))
    }
}

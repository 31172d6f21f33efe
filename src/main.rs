mod commands;
mod repl;
mod utils;

use clap::Parser;
use clap_repl::ClapEditor;
use clap_repl::reedline::{
    DefaultPrompt, FileBackedHistory, Highlighter, Prompt, PromptEditMode, PromptHistorySearch,
    StyledText,
};
use dinfo::debug::{DebugInfo, ParseOptions};
use dinfo::elf::ElfFile;
use nu_ansi_term::{Color, Style};
use repl::Repl;
use std::borrow::Cow;
use std::io;
use std::path::PathBuf;
use std::process;

use crate::utils::warn;

const HISTORY_SIZE: usize = 10000;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// path to an executable or shared object with DWARF debugging info
    exe: PathBuf,

    /// Most entries with children that can be nested within a unit
    #[arg(long, default_value_t = 1024)]
    max_depth: usize,

    /// Stop looking for compilation units after this many
    #[arg(long)]
    max_units: Option<usize>,
}

/// Shows what the user types in blue.
pub struct MyHighlighter {
    color: Color,
}

impl Highlighter for MyHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled_text = StyledText::new();

        styled_text.push((Style::new().fg(self.color), line.to_string()));

        styled_text
    }
}

impl MyHighlighter {
    pub fn new() -> MyHighlighter {
        MyHighlighter { color: Color::Blue }
    }
}

impl Default for MyHighlighter {
    fn default() -> Self {
        MyHighlighter::new()
    }
}

pub struct MyPrompt {
    color: clap_repl::reedline::Color,
    default: DefaultPrompt,
}

impl Prompt for MyPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Borrowed("dinfo")
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("> ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        self.default.render_prompt_multiline_indicator()
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<str> {
        self.default
            .render_prompt_history_search_indicator(history_search)
    }

    // the text that appears in the prompt
    fn get_prompt_color(&self) -> clap_repl::reedline::Color {
        self.color
    }

    // the symbol that typically appears in the prompt, e.g. '>'
    fn get_indicator_color(&self) -> clap_repl::reedline::Color {
        clap_repl::reedline::Color::Black
    }
}

impl MyPrompt {
    fn new() -> MyPrompt {
        MyPrompt {
            color: clap_repl::reedline::Color::DarkBlue,
            default: DefaultPrompt::default(),
        }
    }
}

fn load_exe(path: PathBuf) -> ElfFile {
    match ElfFile::new(path.clone()) {
        Ok(file) => file,
        Err(e) => {
            warn(&format!("Couldn't load {}: {e}", path.display()));
            process::exit(1);
        }
    }
}

/// History is saved in the home directory. If there isn't one we just go without.
fn history() -> Option<Box<FileBackedHistory>> {
    let path = dirs::home_dir()?.join(".dinfo-history");
    match FileBackedHistory::with_file(HISTORY_SIZE, path) {
        Ok(history) => Some(Box::new(history)),
        Err(e) => {
            warn(&format!("Couldn't open history: {e}"));
            None
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let file = load_exe(cli.exe);
    let options = ParseOptions {
        max_depth: cli.max_depth,
        max_units: cli.max_units.unwrap_or(usize::MAX),
    };
    let info = DebugInfo::open_with(&file, &options);
    if info.unit_count() == 0 && info.errors().is_empty() {
        warn(&format!("{} has no DWARF debugging info", file.path.display()));
    } else if !info.errors().is_empty() {
        warn(&format!(
            "{} unit(s) couldn't be parsed, use the errors command for details",
            info.errors().len()
        ));
    }

    // left prompt                    before what the user types
    // highlighter                    this is for what the user types
    // with_visual_selection_style    this is for the selection
    let prompt = MyPrompt::new();
    let rl = ClapEditor::<Repl>::builder()
        .with_prompt(Box::new(prompt))
        .with_editor_hook(|reed| {
            let reed = reed.with_highlighter(Box::new(MyHighlighter::new()));
            match history() {
                Some(history) => reed.with_history(history),
                None => reed,
            }
        })
        .build();

    use repl::MainCommand::*;
    rl.repl(|repl: Repl| match repl.command {
        Abbrevs(args) => commands::abbrevs(&info, &args, io::stdout()),
        Die(args) => commands::die(&info, &args, io::stdout()),
        Errors => commands::errors(&info, io::stdout()),
        Sections(args) => commands::sections(&file, &args, io::stdout()),
        Tree(args) => commands::tree(&info, &args, io::stdout()),
        Units(args) => commands::units(&info, &args, io::stdout()),
        Quit => process::exit(0),
    });
}

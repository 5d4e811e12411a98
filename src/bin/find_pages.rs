//! Search a paginated text dump
//!
//! Pages are separated by form feeds, lines by newlines (the layout
//! `pdftotext` produces). Prints every match with its page, offset and
//! surrounding text.
//!
//! Usage:
//!   cargo run --release --bin find_pages -- document.txt "search terms"
//!   cargo run --release --bin find_pages -- --entire-word --json document.txt cat dog
//!
//! Several terms are searched as alternatives. Set `RUST_LOG=debug` to
//! follow the find cycle.

use find_oxide::search::{FindKind, HighlightSpan, Query, SearchEvent, SearchOptions, SessionState};
use find_oxide::{FindConfig, FindController, PageTextSource, StaticPages};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

const CONTEXT_CHARS: usize = 20;

struct FindArgs {
    path: PathBuf,
    terms: Vec<String>,
    case_sensitive: bool,
    entire_word: bool,
    match_diacritics: bool,
    json: bool,
}

impl FindArgs {
    fn from_args() -> Option<Self> {
        let mut positional = Vec::new();
        let mut args = Self {
            path: PathBuf::new(),
            terms: Vec::new(),
            case_sensitive: false,
            entire_word: false,
            match_diacritics: false,
            json: false,
        };

        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "--case-sensitive" | "-c" => args.case_sensitive = true,
                "--entire-word" | "-w" => args.entire_word = true,
                "--match-diacritics" | "-d" => args.match_diacritics = true,
                "--json" => args.json = true,
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        args.path = PathBuf::from(positional.next()?);
        args.terms = positional.filter(|t| !t.is_empty()).collect();
        if args.terms.is_empty() {
            return None;
        }
        Some(args)
    }

    fn options(&self) -> SearchOptions {
        let query = match self.terms.as_slice() {
            [single] => Query::Text(single.clone()),
            terms => Query::Terms(terms.to_vec()),
        };
        SearchOptions::new(query)
            .with_case_sensitive(self.case_sensitive)
            .with_entire_word(self.entire_word)
            .with_match_diacritics(self.match_diacritics)
            .with_highlight_all(true)
            .with_kind(FindKind::Again)
    }
}

#[derive(Serialize)]
struct MatchRecord<'a> {
    page: usize,
    offset: usize,
    length: usize,
    text: &'a str,
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(args) = FindArgs::from_args() else {
        eprintln!(
            "Usage: find_pages [--case-sensitive] [--entire-word] [--match-diacritics] [--json] <file> <term>..."
        );
        return ExitCode::from(2);
    };

    let text = match std::fs::read_to_string(&args.path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {}", args.path.display(), e);
            return ExitCode::FAILURE;
        },
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        },
    };

    match runtime.block_on(run(&args, &text)) {
        Ok(0) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

async fn run(args: &FindArgs, text: &str) -> find_oxide::Result<usize> {
    let source = StaticPages::from_form_feeds(text);
    // Match offsets index the page text without line breaks.
    let pages: Vec<String> = (0..source.page_count())
        .map(|page| source.page(page).unwrap_or_default().replace('\n', ""))
        .collect();

    let config = FindConfig::new().with_report_progress(false);
    let (controller, mut events) = FindController::spawn(source, config);
    controller.find(args.options())?;

    // Without progress reports the first count or settled state arrives
    // once every page was searched.
    while let Some(event) = events.recv().await {
        match event {
            SearchEvent::MatchCountProgress(_) => break,
            SearchEvent::StateChanged(update) if update.state != SessionState::Pending => break,
            _ => {},
        }
    }

    let mut total = 0;
    let mut pages_with_matches = 0;
    for (page, page_text) in pages.iter().enumerate() {
        let spans = controller
            .highlight_spans(page, std::slice::from_ref(page_text))
            .await?;
        if spans.is_empty() {
            continue;
        }
        pages_with_matches += 1;
        total += spans.len();
        for span in &spans {
            print_match(page, page_text, span, args.json);
        }
    }

    if !args.json {
        println!("{} matches on {} of {} pages", total, pages_with_matches, pages.len());
    }
    controller.shutdown()?;
    Ok(total)
}

fn print_match(page: usize, page_text: &str, span: &HighlightSpan, json: bool) {
    let chars: Vec<char> = page_text.chars().collect();
    let matched: String = chars[span.start..span.end].iter().collect();

    if json {
        let record = MatchRecord {
            page: page + 1,
            offset: span.start,
            length: span.end - span.start,
            text: &matched,
        };
        match serde_json::to_string(&record) {
            Ok(line) => println!("{}", line),
            Err(e) => log::warn!("Cannot serialize match: {}", e),
        }
        return;
    }

    let before: String = chars[span.start.saturating_sub(CONTEXT_CHARS)..span.start]
        .iter()
        .collect();
    let after: String = chars[span.end..(span.end + CONTEXT_CHARS).min(chars.len())]
        .iter()
        .collect();
    println!("page {:>4} @{:<6} {}[{}]{}", page + 1, span.start, before, matched, after);
}

//! Incremental, resumable find session over a paginated document.
//!
//! The session is a synchronous state machine. Its driver feeds it find
//! commands, viewer position changes and page text as extraction completes,
//! and drains the notifications it queues. Nothing here waits: the three
//! suspension points of a find cycle are surfaced to the driver instead.
//!
//! - [`FindAction::Debounce`]: call [`SearchSession::debounce_elapsed`] after
//!   the delay unless another command came first
//! - [`SearchSession::next_extraction`]: the page whose text to fetch next
//!   (one at a time, ascending)
//! - a scan reaching a page without text pauses and resumes by itself once
//!   [`SearchSession::page_text_extracted`] delivers that page
//!
//! A "dirty" find (new query or options) starts a new cycle: the selection
//! and all match lists are discarded, while extracted page text is kept.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::FindConfig;
use crate::error::{Error, Result};
use crate::search::events::{MatchesCount, PageTarget, SearchEvent, SessionState, StateUpdate};
use crate::search::highlight::{HighlightProjector, HighlightSpan};
use crate::search::options::{FindKind, SearchOptions};
use crate::search::page_index::{PageMatch, PageMatchIndex};
use crate::search::pattern::PatternCompiler;

/// What the driver must do after [`SearchSession::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindAction {
    /// (Re)start the debounce timer with this delay.
    Debounce(Duration),
    /// Nothing to wait for; drop any running debounce timer.
    Settled,
}

/// The selected match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPointer {
    /// Page of the selected match
    pub page_index: usize,
    /// Index into that page's match list
    pub match_index: usize,
}

/// Position of the scan in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCursor {
    /// Page the scan is on
    pub page_index: usize,
    /// `None` until a match on `page_index` is selected
    pub match_index: Option<usize>,
    /// Set when the scan went past the last (or first) page
    pub wrapped: bool,
}

/// Find state for one document.
#[derive(Debug)]
pub struct SearchSession {
    config: FindConfig,
    pages: Vec<Option<PageMatchIndex>>,
    options: Option<SearchOptions>,
    compiler: Option<PatternCompiler>,
    state: SessionState,
    selected: Option<SelectionPointer>,
    cursor: ScanCursor,
    /// Page a paused scan waits on
    resume_page: Option<usize>,
    pages_to_search: isize,
    dirty: bool,
    /// Whether highlights are shown at all (false once the find bar closed)
    highlight_matches: bool,
    /// A debounced search is waiting for its timer
    search_pending: bool,
    extraction_started: bool,
    extraction_in_flight: Option<usize>,
    /// A clear from `close()` waits for the in-flight extraction
    clear_pending: bool,
    total_matches: usize,
    visited_pages: usize,
    current_page: usize,
    visible_pages: Option<BTreeSet<usize>>,
    events: Vec<SearchEvent>,
}

impl SearchSession {
    /// Create a session for a document with `page_count` pages.
    pub fn new(page_count: usize, config: FindConfig) -> Self {
        Self {
            config,
            pages: vec![None; page_count],
            options: None,
            compiler: None,
            state: SessionState::Pending,
            selected: None,
            cursor: ScanCursor::default(),
            resume_page: None,
            pages_to_search: 0,
            dirty: true,
            highlight_matches: false,
            search_pending: false,
            extraction_started: false,
            extraction_in_flight: None,
            clear_pending: false,
            total_matches: 0,
            visited_pages: 0,
            current_page: 0,
            visible_pages: None,
            events: Vec::new(),
        }
    }

    /// Forget everything about the previous document.
    pub fn reset(&mut self, page_count: usize) {
        log::debug!("Resetting find session for {} pages", page_count);
        *self = Self::new(page_count, self.config.clone());
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Session configuration.
    pub fn config(&self) -> &FindConfig {
        &self.config
    }

    /// State of the current find cycle.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The selected match, if any.
    pub fn selected(&self) -> Option<SelectionPointer> {
        self.selected
    }

    /// Where the scan currently is.
    pub fn cursor(&self) -> ScanCursor {
        self.cursor
    }

    /// Options of the last find command.
    pub fn options(&self) -> Option<&SearchOptions> {
        self.options.as_ref()
    }

    /// Page a paused scan is waiting on.
    pub fn resume_page(&self) -> Option<usize> {
        self.resume_page
    }

    /// Whether a debounced search waits for its timer.
    pub fn search_pending(&self) -> bool {
        self.search_pending
    }

    /// Page whose text is being extracted.
    pub fn extraction_in_flight(&self) -> Option<usize> {
        self.extraction_in_flight
    }

    /// Whether highlights are currently shown.
    pub fn highlight_matches(&self) -> bool {
        self.highlight_matches
    }

    /// Matches of a page for the current cycle, `None` until computed.
    pub fn page_matches(&self, page: usize) -> Option<&[PageMatch]> {
        self.pages.get(page)?.as_ref()?.matches()
    }

    /// Take the notifications queued since the last call.
    pub fn take_events(&mut self) -> Vec<SearchEvent> {
        std::mem::take(&mut self.events)
    }

    /// The viewer's current page, where new scans start.
    pub fn set_current_page(&mut self, page: usize) -> Result<()> {
        self.check_page(page)?;
        self.current_page = page;
        Ok(())
    }

    /// Pages the viewer currently shows. `None` means unknown, which counts
    /// every page as visible.
    pub fn set_visible_pages(&mut self, pages: Option<BTreeSet<usize>>) {
        self.visible_pages = pages;
    }

    /// Handle a find command.
    pub fn find(&mut self, options: SearchOptions) -> FindAction {
        if std::mem::take(&mut self.clear_pending) {
            self.emit(SearchEvent::ClearHighlights(PageTarget::All));
        }

        let kind = options.kind;
        let highlight_all = options.highlight_all;
        if self.should_dirty(&options) {
            self.dirty = true;
        }
        if self.dirty {
            if let Some(page) = self.resume_page.take() {
                log::debug!("Dropping scan paused on page {}", page);
            }
        }

        self.options = Some(options);
        if kind != FindKind::HighlightAllChange {
            self.update_ui_state(SessionState::Pending, false);
        }
        self.extraction_started = true;

        let findbar_closed = !self.highlight_matches;
        let pending_timeout = std::mem::take(&mut self.search_pending);

        match kind {
            FindKind::Typing => {
                self.search_pending = true;
                return FindAction::Debounce(self.config.debounce);
            },
            _ if self.dirty => self.next_match(),
            FindKind::Again => {
                self.next_match();
                if findbar_closed && highlight_all {
                    self.emit(SearchEvent::ApplyHighlights(PageTarget::All));
                }
            },
            FindKind::HighlightAllChange => {
                if pending_timeout {
                    self.next_match();
                } else {
                    self.highlight_matches = true;
                }
                self.emit(SearchEvent::ApplyHighlights(PageTarget::All));
            },
            FindKind::OptionChange => self.next_match(),
        }

        FindAction::Settled
    }

    /// The debounce timer fired.
    pub fn debounce_elapsed(&mut self) {
        if std::mem::take(&mut self.search_pending) {
            self.next_match();
        }
    }

    /// The find bar was closed.
    pub fn close(&mut self) {
        self.search_pending = false;
        if let Some(page) = self.resume_page.take() {
            log::debug!("Find bar closed while waiting on page {}", page);
            self.dirty = true;
        }
        self.update_ui_state(SessionState::Found, false);
        self.highlight_matches = false;

        if self.extraction_in_flight.is_some() {
            self.clear_pending = true;
        } else {
            self.emit(SearchEvent::ClearHighlights(PageTarget::All));
        }
    }

    /// Next page whose text should be extracted, if any.
    ///
    /// Pages are requested in ascending order once the first find arrived,
    /// and only one request is outstanding at a time.
    pub fn next_extraction(&mut self) -> Option<usize> {
        if !self.extraction_started || self.extraction_in_flight.is_some() {
            return None;
        }
        let page = self.pages.iter().position(Option::is_none)?;
        self.extraction_in_flight = Some(page);
        log::debug!("Requesting text of page {}", page);
        Some(page)
    }

    /// Deliver the text of a page. A failed extraction is logged and the
    /// page is searched as empty.
    pub fn page_text_extracted(&mut self, page: usize, text: Result<String>) -> Result<()> {
        self.check_page(page)?;
        if self.extraction_in_flight == Some(page) {
            self.extraction_in_flight = None;
        }

        if self.pages[page].is_some() {
            log::debug!("Ignoring duplicate text for page {}", page);
        } else {
            let index = match text {
                Ok(text) => PageMatchIndex::new(page, &text),
                Err(err) => {
                    log::warn!("{}", err);
                    PageMatchIndex::empty(page)
                },
            };
            self.pages[page] = Some(index);

            if !self.dirty && self.compiler.is_some() {
                self.compute_page_matches(page);
            }
        }

        if self.extraction_in_flight.is_none() && std::mem::take(&mut self.clear_pending) {
            self.emit(SearchEvent::ClearHighlights(PageTarget::All));
        }
        Ok(())
    }

    /// Rank of the selected match among all matches found so far.
    ///
    /// Both numbers are 0 while the rank is not meaningful yet.
    pub fn matches_count(&self) -> MatchesCount {
        let total = self.total_matches;
        let current = self.selected.map_or(0, |selected| {
            let before: usize = (0..selected.page_index).map(|page| self.page_match_count(page)).sum();
            before + selected.match_index + 1
        });

        if current < 1 || current > total {
            return MatchesCount::default();
        }
        MatchesCount::new(current, total)
    }

    /// Highlight spans for a page's text layer.
    pub fn highlight_spans<T: AsRef<str>>(&self, page: usize, fragments: &[T]) -> Vec<HighlightSpan> {
        if !self.highlight_matches {
            return Vec::new();
        }
        let Some(matches) = self.page_matches(page) else {
            return Vec::new();
        };
        let selected = self
            .selected
            .filter(|s| s.page_index == page)
            .map(|s| s.match_index);
        let highlight_all = self.options.as_ref().is_some_and(|o| o.highlight_all);
        HighlightProjector::new(selected, highlight_all).project(matches, fragments)
    }

    fn should_dirty(&self, options: &SearchOptions) -> bool {
        let Some(previous) = &self.options else {
            return true;
        };
        if previous.query != options.query {
            return true;
        }
        match options.kind {
            // Searching again from a selection the user scrolled away from
            // restarts at the current page.
            FindKind::Again => self.selected.is_some_and(|s| {
                s.page_index < self.page_count()
                    && s.page_index != self.current_page
                    && !self.is_page_visible(s.page_index)
            }),
            FindKind::HighlightAllChange => false,
            FindKind::Typing | FindKind::OptionChange => true,
        }
    }

    fn is_page_visible(&self, page: usize) -> bool {
        self.visible_pages
            .as_ref()
            .map_or(true, |visible| visible.contains(&page))
    }

    fn find_previous(&self) -> bool {
        self.options.as_ref().is_some_and(|o| o.find_previous)
    }

    fn page_match_count(&self, page: usize) -> usize {
        self.page_matches(page).map_or(0, <[PageMatch]>::len)
    }

    fn check_page(&self, page: usize) -> Result<()> {
        if page >= self.page_count() {
            return Err(Error::PageOutOfRange {
                page,
                page_count: self.page_count(),
            });
        }
        Ok(())
    }

    fn emit(&mut self, event: SearchEvent) {
        self.events.push(event);
    }

    fn next_match(&mut self) {
        let previous = self.find_previous();
        self.highlight_matches = true;

        if self.dirty {
            self.reset_matches();
        }

        if self.compiler.as_ref().map_or(true, PatternCompiler::is_empty) {
            self.update_ui_state(SessionState::Found, false);
            return;
        }
        // A paused scan continues once its page arrives.
        if self.resume_page.is_some() {
            return;
        }

        let page_count = self.page_count();
        if page_count == 0 {
            self.update_ui_state(SessionState::NotFound, previous);
            return;
        }
        self.pages_to_search = page_count as isize;

        if let Some(match_index) = self.cursor.match_index {
            let count = self.page_match_count(self.cursor.page_index);
            if (!previous && match_index + 1 < count) || (previous && match_index > 0) {
                self.cursor.match_index = Some(if previous { match_index - 1 } else { match_index + 1 });
                self.update_match(true);
                return;
            }
            self.advance_cursor_page(previous);
        }

        self.scan();
    }

    /// Start a new cycle for the current options.
    fn reset_matches(&mut self) {
        self.dirty = false;
        self.selected = None;
        self.cursor = ScanCursor {
            page_index: self.current_page,
            match_index: None,
            wrapped: false,
        };
        self.resume_page = None;
        for page in self.pages.iter_mut().flatten() {
            page.clear_matches();
        }
        self.visited_pages = 0;
        self.total_matches = 0;
        self.compiler = self.options.as_ref().map(PatternCompiler::new);

        log::debug!(
            "New find cycle for {:?}, starting at page {}",
            self.options.as_ref().map(|o| &o.query),
            self.current_page
        );
        self.emit(SearchEvent::ClearHighlights(PageTarget::All));

        let ready: Vec<usize> = self
            .pages
            .iter()
            .enumerate()
            .filter_map(|(page, index)| index.as_ref().map(|_| page))
            .collect();
        for page in ready {
            self.compute_page_matches(page);
        }
    }

    fn scan(&mut self) {
        if let Err(err) = self.next_page_match() {
            log::error!("{}", err);
        }
    }

    /// Walk pages from the cursor until a match is selected, the document
    /// is exhausted, or a page without text is reached.
    fn next_page_match(&mut self) -> Result<()> {
        if let Some(page) = self.resume_page {
            return Err(Error::ScanAlreadyPending { page });
        }

        loop {
            let page = self.cursor.page_index;
            let computed = self
                .pages
                .get(page)
                .and_then(Option::as_ref)
                .map(PageMatchIndex::match_count);
            let count = match computed {
                Some(Some(count)) => count,
                Some(None) => {
                    self.compute_page_matches(page);
                    self.page_match_count(page)
                },
                None => {
                    log::debug!("Scan paused until page {} is extracted", page);
                    self.resume_page = Some(page);
                    return Ok(());
                },
            };

            if self.matches_ready(count) {
                return Ok(());
            }
        }
    }

    fn matches_ready(&mut self, count: usize) -> bool {
        let previous = self.find_previous();
        if count > 0 {
            self.cursor.match_index = Some(if previous { count - 1 } else { 0 });
            self.update_match(true);
            return true;
        }

        self.advance_cursor_page(previous);
        if self.cursor.wrapped {
            self.cursor.match_index = None;
            if self.pages_to_search < 0 {
                // A full cycle found nothing.
                self.update_match(false);
                return true;
            }
        }
        false
    }

    fn advance_cursor_page(&mut self, previous: bool) {
        let page_count = self.page_count();
        let cursor = &mut self.cursor;
        cursor.match_index = None;
        self.pages_to_search -= 1;

        let next = if previous {
            cursor.page_index.checked_sub(1)
        } else {
            Some(cursor.page_index + 1).filter(|&page| page < page_count)
        };
        match next {
            Some(page) => cursor.page_index = page,
            None => {
                cursor.page_index = if previous { page_count.saturating_sub(1) } else { 0 };
                cursor.wrapped = true;
            },
        }
    }

    fn update_match(&mut self, found: bool) {
        let wrapped = std::mem::take(&mut self.cursor.wrapped);
        let mut state = SessionState::NotFound;

        if found {
            let previous_page = self.selected.map(|s| s.page_index);
            if let Some(match_index) = self.cursor.match_index {
                self.selected = Some(SelectionPointer {
                    page_index: self.cursor.page_index,
                    match_index,
                });
            }
            state = if wrapped {
                SessionState::Wrapped
            } else {
                SessionState::Found
            };
            if let Some(page) = previous_page.filter(|&page| page != self.cursor.page_index) {
                self.emit(SearchEvent::ApplyHighlights(PageTarget::Page(page)));
            }
        }

        self.update_ui_state(state, self.find_previous());
        if let Some(selected) = self.selected {
            self.emit(SearchEvent::ApplyHighlights(PageTarget::Page(selected.page_index)));
        }
    }

    fn compute_page_matches(&mut self, page: usize) {
        let Some(options) = &self.options else {
            return;
        };
        let (entire_word, highlight_all) = (options.entire_word, options.highlight_all);
        let (Some(compiler), Some(Some(index))) = (self.compiler.as_mut(), self.pages.get_mut(page)) else {
            return;
        };

        let pattern = match compiler.pattern(index.has_diacritics()) {
            Ok(pattern) => pattern,
            Err(err) => {
                log::error!("Page {}: {}", page, err);
                None
            },
        };
        let count = index.compute_matches(pattern, entire_word).len();

        self.total_matches += count;
        self.visited_pages += 1;

        if highlight_all && self.highlight_matches {
            self.emit(SearchEvent::ApplyHighlights(PageTarget::Page(page)));
        }

        if self.resume_page == Some(page) {
            self.resume_page = None;
            log::debug!("Resuming scan at page {}", page);
            self.scan();
        }

        if self.config.report_progress {
            if count > 0 {
                self.emit(SearchEvent::MatchCountProgress(self.matches_count()));
            }
        } else if self.visited_pages == self.page_count() {
            self.emit(SearchEvent::MatchCountProgress(self.matches_count()));
        }
    }

    fn update_ui_state(&mut self, state: SessionState, find_previous: bool) {
        self.state = state;
        if !self.config.report_progress
            && (self.visited_pages != self.page_count() || state == SessionState::Pending)
        {
            return;
        }

        let update = StateUpdate {
            state,
            find_previous,
            entire_word: self.options.as_ref().is_some_and(|o| o.entire_word),
            counts: self.matches_count(),
            raw_query: self.options.as_ref().map(|o| o.query.clone()),
        };
        self.emit(SearchEvent::StateChanged(update));
    }
}

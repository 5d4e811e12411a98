//! Asynchronous driver for a [`SearchSession`].
//!
//! [`FindController::spawn`] starts one tokio task that owns the session.
//! Commands arrive over a channel and are applied in order; the task also
//! waits on the debounce timer and on the single page extraction in flight,
//! and forwards every session notification to the event receiver.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Sleep;

use crate::config::FindConfig;
use crate::error::{Error, Result};
use crate::search::{FindAction, HighlightSpan, MatchesCount, SearchEvent, SearchOptions, SearchSession};
use crate::source::PageTextSource;

type Extraction = Pin<Box<dyn Future<Output = (u64, usize, Result<String>)> + Send>>;

enum Command<S> {
    Find(SearchOptions),
    Close,
    SetView {
        current_page: usize,
        visible_pages: Option<BTreeSet<usize>>,
    },
    SetDocument(Arc<S>),
    MatchesCount(oneshot::Sender<MatchesCount>),
    HighlightSpans {
        page: usize,
        fragments: Vec<String>,
        reply: oneshot::Sender<Vec<HighlightSpan>>,
    },
    Shutdown,
}

/// Handle to a running find task.
///
/// Dropping the handle stops the task once pending commands are handled.
#[derive(Debug)]
pub struct FindController<S: PageTextSource> {
    commands: mpsc::UnboundedSender<Command<S>>,
}

impl<S: PageTextSource> FindController<S> {
    /// Start a find task for `source`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(source: S, config: FindConfig) -> (Self, mpsc::UnboundedReceiver<SearchEvent>) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (events, event_rx) = mpsc::unbounded_channel();

        let worker = Worker {
            session: SearchSession::new(source.page_count(), config),
            source: Arc::new(source),
            events,
            generation: 0,
        };
        tokio::spawn(worker.run(command_rx));

        (Self { commands }, event_rx)
    }

    /// Run a find command.
    pub fn find(&self, options: SearchOptions) -> Result<()> {
        self.send(Command::Find(options))
    }

    /// The find bar was closed.
    pub fn close(&self) -> Result<()> {
        self.send(Command::Close)
    }

    /// Report the viewer's current page and the pages it shows.
    pub fn set_view(&self, current_page: usize, visible_pages: Option<BTreeSet<usize>>) -> Result<()> {
        self.send(Command::SetView {
            current_page,
            visible_pages,
        })
    }

    /// Switch to another document. Work for the previous one is dropped.
    pub fn set_document(&self, source: S) -> Result<()> {
        self.send(Command::SetDocument(Arc::new(source)))
    }

    /// Current match counts.
    pub async fn matches_count(&self) -> Result<MatchesCount> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::MatchesCount(reply))?;
        rx.await.map_err(|_| Error::ControllerClosed)
    }

    /// Highlight spans for the text layer of a page.
    pub async fn highlight_spans<T: AsRef<str>>(
        &self,
        page: usize,
        fragments: &[T],
    ) -> Result<Vec<HighlightSpan>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::HighlightSpans {
            page,
            fragments: fragments.iter().map(|f| f.as_ref().to_string()).collect(),
            reply,
        })?;
        rx.await.map_err(|_| Error::ControllerClosed)
    }

    /// Stop the task after the commands already sent.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Whether the task has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn send(&self, command: Command<S>) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::ControllerClosed)
    }
}

struct Worker<S> {
    session: SearchSession,
    source: Arc<S>,
    events: mpsc::UnboundedSender<SearchEvent>,
    /// Bumped on every document change; tags extraction results.
    generation: u64,
}

impl<S: PageTextSource> Worker<S> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command<S>>) {
        let mut debounce: Option<Pin<Box<Sleep>>> = None;
        let mut extraction: Option<Extraction> = None;

        loop {
            if extraction.is_none() {
                extraction = self.session.next_extraction().map(|page| self.extract(page));
            }
            self.flush_events();

            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    match command {
                        Command::Find(options) => match self.session.find(options) {
                            FindAction::Debounce(delay) => {
                                debounce = Some(Box::pin(tokio::time::sleep(delay)));
                            },
                            FindAction::Settled => debounce = None,
                        },
                        Command::Close => {
                            self.session.close();
                            debounce = None;
                        },
                        Command::SetView { current_page, visible_pages } => {
                            if let Err(err) = self.session.set_current_page(current_page) {
                                log::warn!("{}", err);
                            }
                            self.session.set_visible_pages(visible_pages);
                        },
                        Command::SetDocument(source) => {
                            self.generation += 1;
                            extraction = None;
                            debounce = None;
                            self.session.reset(source.page_count());
                            self.source = source;
                        },
                        Command::MatchesCount(reply) => {
                            let _ = reply.send(self.session.matches_count());
                        },
                        Command::HighlightSpans { page, fragments, reply } => {
                            let _ = reply.send(self.session.highlight_spans(page, &fragments));
                        },
                        Command::Shutdown => break,
                    }
                }
                () = async {
                    if let Some(timer) = &mut debounce {
                        timer.await;
                    }
                }, if debounce.is_some() => {
                    debounce = None;
                    self.session.debounce_elapsed();
                }
                (generation, page, text) = async {
                    match &mut extraction {
                        Some(pending) => pending.await,
                        None => std::future::pending().await,
                    }
                }, if extraction.is_some() => {
                    extraction = None;
                    if generation != self.generation {
                        log::debug!("Discarding text of page {} from a previous document", page);
                        continue;
                    }
                    if let Err(err) = self.session.page_text_extracted(page, text) {
                        log::error!("{}", err);
                    }
                }
            }
        }

        self.flush_events();
        log::debug!("Find task stopped");
    }

    fn extract(&self, page: usize) -> Extraction {
        let source = Arc::clone(&self.source);
        let generation = self.generation;
        Box::pin(async move {
            let text = source.extract_page_text(page).await;
            (generation, page, text)
        })
    }

    fn flush_events(&mut self) {
        for event in self.session.take_events() {
            if self.events.send(event).is_err() {
                log::trace!("Event receiver dropped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{FindKind, HighlightKind, PageTarget, SessionState};
    use crate::source::StaticPages;
    use std::time::Duration;

    /// Pages that take a while to extract; one of them may fail.
    struct SlowPages {
        pages: Vec<&'static str>,
        delay: Duration,
        failing: Option<usize>,
    }

    impl SlowPages {
        fn new(pages: Vec<&'static str>) -> Self {
            Self {
                pages,
                delay: Duration::from_millis(10),
                failing: None,
            }
        }
    }

    impl PageTextSource for SlowPages {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn extract_page_text(&self, page_index: usize) -> impl Future<Output = Result<String>> + Send {
            let delay = self.delay;
            let text = if self.failing == Some(page_index) {
                Err(Error::Extraction {
                    page: page_index,
                    reason: "corrupt content stream".to_string(),
                })
            } else {
                Ok(self.pages[page_index].to_string())
            };
            async move {
                tokio::time::sleep(delay).await;
                text
            }
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SearchEvent>) -> Vec<SearchEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn states(events: &[SearchEvent]) -> Vec<SessionState> {
        events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::StateChanged(update) => Some(update.state),
                _ => None,
            })
            .collect()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_is_debounced_and_replaced() {
        let source = StaticPages::new(["The cat sat.", "A c\u{00E1}t sits."]);
        let (controller, mut rx) = FindController::spawn(source, FindConfig::default());

        controller.find(SearchOptions::new("c")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.find(SearchOptions::new("cat")).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // 300ms after the first keystroke, 200ms after the second
        let events = drain(&mut rx);
        assert_eq!(states(&events), vec![SessionState::Pending, SessionState::Pending]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let events = drain(&mut rx);
        assert_eq!(states(&events), vec![SessionState::Found]);
        assert_eq!(controller.matches_count().await.unwrap(), MatchesCount::new(1, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extraction_failure_is_an_empty_page() {
        let mut source = SlowPages::new(vec!["broken cat", "cat"]);
        source.failing = Some(0);
        let (controller, mut rx) = FindController::spawn(source, FindConfig::default());

        controller
            .find(SearchOptions::new("cat").with_kind(FindKind::Again))
            .unwrap();
        settle().await;

        assert_eq!(states(&drain(&mut rx)).last(), Some(&SessionState::Found));
        assert_eq!(controller.matches_count().await.unwrap(), MatchesCount::new(1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_clear_waits_for_extraction() {
        let source = SlowPages::new(vec!["cat", "cat"]);
        let (controller, mut rx) = FindController::spawn(source, FindConfig::default());

        controller
            .find(SearchOptions::new("cat").with_kind(FindKind::Again))
            .unwrap();
        controller.close().unwrap();
        settle().await;

        let events = drain(&mut rx);
        let highlights: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, SearchEvent::ApplyHighlights(_) | SearchEvent::ClearHighlights(_)))
            .collect();
        assert!(highlights
            .iter()
            .all(|e| **e == SearchEvent::ClearHighlights(PageTarget::All)));
        // One clear when the cycle started, one deferred from the close
        assert_eq!(highlights.len(), 2);
        assert!(controller
            .highlight_spans(0, &["cat"])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_document_change_drops_stale_work() {
        let mut first = SlowPages::new(vec!["cat"]);
        first.delay = Duration::from_millis(500);
        let (controller, mut rx) = FindController::spawn(first, FindConfig::default());

        controller
            .find(SearchOptions::new("cat").with_kind(FindKind::Again))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        controller
            .set_document(SlowPages::new(vec!["dog", "cat"]))
            .unwrap();
        controller
            .find(SearchOptions::new("cat").with_kind(FindKind::Again))
            .unwrap();
        settle().await;

        assert_eq!(states(&drain(&mut rx)).last(), Some(&SessionState::Found));
        let spans = controller.highlight_spans(1, &["cat"]).await.unwrap();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].selected);
        assert!(controller.highlight_spans(0, &["dog"]).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_highlight_spans_across_fragments() {
        let source = StaticPages::new(["The cat sat."]);
        let (controller, _rx) = FindController::spawn(source, FindConfig::default());

        controller
            .find(
                SearchOptions::new("cat")
                    .with_kind(FindKind::Again)
                    .with_highlight_all(true),
            )
            .unwrap();
        settle().await;

        let spans = controller
            .highlight_spans(0, &["The ca", "t sat."])
            .await
            .unwrap();
        let kinds: Vec<_> = spans.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![HighlightKind::Begin, HighlightKind::End]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_changes_restart_scan() {
        let source = StaticPages::new(["cat", "x", "cat"]);
        let (controller, _rx) = FindController::spawn(source, FindConfig::default());

        controller.set_view(2, Some(BTreeSet::from([2]))).unwrap();
        controller
            .find(SearchOptions::new("cat").with_kind(FindKind::Again))
            .unwrap();
        settle().await;

        assert_eq!(controller.matches_count().await.unwrap(), MatchesCount::new(2, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_after_shutdown_fail() {
        let (controller, _rx) = FindController::spawn(StaticPages::default(), FindConfig::default());
        controller.shutdown().unwrap();
        settle().await;

        assert!(controller.is_closed());
        assert!(matches!(controller.close(), Err(Error::ControllerClosed)));
        assert!(matches!(controller.matches_count().await, Err(Error::ControllerClosed)));
    }
}

use anyhow::Result;
use clipjar_core::{parse_tags, Clip, ClipId, ClipKind, NewClip, Session, SortOrder};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::actions;
use crate::copy_helpers::Clipboard;
use crate::theme::TuiTheme;

const DELETE_CONFIRM: Duration = Duration::from_millis(1500);
const PAGE: usize = 10;

pub trait EventSource {
    fn poll(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

pub struct RealEventSource;

impl EventSource for RealEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if crossterm::event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }
}

pub fn run_browser(
    session: &mut Session<'_>,
    clipboard: &dyn Clipboard,
    download_dir: &Path,
    theme: &TuiTheme,
) -> Result<()> {
    let mut es = RealEventSource;
    if let Some(id) = run_browser_with(session, clipboard, download_dir, theme, &mut es, true)? {
        println!("{}", id);
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Body,
    Tags,
    Memo,
}

/// Draft for a new clip. For images `body` holds the file path.
#[derive(Debug)]
struct Compose {
    kind: ClipKind,
    body: String,
    tags: String,
    memo: String,
    field: Field,
}

impl Compose {
    fn new(kind: ClipKind) -> Self {
        Self {
            kind,
            body: String::new(),
            tags: String::new(),
            memo: String::new(),
            field: Field::Body,
        }
    }

    fn current(&mut self) -> &mut String {
        match self.field {
            Field::Body => &mut self.body,
            Field::Tags => &mut self.tags,
            Field::Memo => &mut self.memo,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            Field::Body => Field::Tags,
            Field::Tags => Field::Memo,
            Field::Memo => Field::Body,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            Field::Body => Field::Memo,
            Field::Tags => Field::Body,
            Field::Memo => Field::Tags,
        };
    }
}

#[derive(Debug)]
enum Mode {
    Normal,
    Search,
    Preview(ClipId),
    Compose(Compose),
}

enum Flow {
    Continue,
    Exit,
}

struct Browser<'t> {
    mode: Mode,
    selected: usize,
    toast: Option<(String, Instant)>,
    pending_delete: Option<(ClipId, Instant)>,
    last_copied: Option<ClipId>,
    theme: &'t TuiTheme,
}

impl<'t> Browser<'t> {
    fn new(theme: &'t TuiTheme) -> Self {
        Self {
            mode: Mode::Normal,
            selected: 0,
            toast: None,
            pending_delete: None,
            last_copied: None,
            theme,
        }
    }

    fn notify(&mut self, msg: impl Into<String>) {
        self.toast = Some((msg.into(), Instant::now() + self.theme.toast));
    }

    fn current(&self, session: &Session<'_>) -> Option<Clip> {
        session.visible().get(self.selected).map(|c| (*c).clone())
    }

    fn clamp(&mut self, session: &Session<'_>) {
        let len = session.visible().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn select_id(&mut self, session: &Session<'_>, id: ClipId) {
        if let Some(pos) = session.visible().iter().position(|c| c.id == id) {
            self.selected = pos;
        }
    }

    fn copy(&mut self, clip: &Clip, clipboard: &dyn Clipboard) {
        match actions::copy_clip(clip, clipboard) {
            Ok(()) => {
                self.last_copied = Some(clip.id);
                self.notify(format!("Copied #{}", clip.id));
            }
            Err(e) => {
                tracing::warn!(id = clip.id, error = %e, "copy failed");
                self.notify(format!("Copy failed: {}", e));
            }
        }
    }

    fn download(&mut self, clip: &Clip, dir: &Path) {
        if clip.kind != ClipKind::Image {
            self.notify("Only images can be downloaded");
            return;
        }
        match actions::download_clip(clip, dir, None) {
            Ok(path) => self.notify(format!("Saved {}", path.display())),
            Err(e) => {
                tracing::warn!(id = clip.id, error = %e, "download failed");
                self.notify(format!("Download failed: {}", e));
            }
        }
    }

    fn delete(&mut self, session: &mut Session<'_>, id: ClipId) {
        let now = Instant::now();
        let confirmed = matches!(self.pending_delete, Some((pending, until)) if pending == id && now <= until);
        if !confirmed {
            self.pending_delete = Some((id, now + DELETE_CONFIRM));
            self.toast = Some(("Press x again to delete".into(), now + DELETE_CONFIRM));
            return;
        }
        self.pending_delete = None;
        match session.delete(id) {
            Ok(()) => self.notify(format!("Deleted #{}", id)),
            Err(e) => {
                tracing::warn!(id, error = %e, "delete failed");
                self.notify(format!("Delete failed: {}", e));
            }
        }
        self.clamp(session);
    }

    fn save_draft(&mut self, session: &mut Session<'_>, draft: &Compose) -> bool {
        let tags = parse_tags(&draft.tags);
        let memo = Some(draft.memo.clone());
        let result = match draft.kind {
            ClipKind::Text => session.save(NewClip::text(draft.body.clone()).with_tags(&tags).with_memo(memo)),
            ClipKind::Image => {
                let path = PathBuf::from(shellexpand::tilde(draft.body.trim()).to_string());
                session.save_image_file(&path, &tags, memo)
            }
        };
        match result {
            Ok(id) => {
                self.notify(format!("Saved #{}", id));
                self.select_id(session, id);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "save failed");
                self.notify(format!("Not saved: {}", e));
                false
            }
        }
    }

    fn move_by(&mut self, session: &Session<'_>, delta: isize) {
        let len = session.visible().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, len as isize - 1) as usize;
    }

    fn navigate(&mut self, session: &Session<'_>, code: KeyCode) -> bool {
        match code {
            KeyCode::Up => self.move_by(session, -1),
            KeyCode::Down => self.move_by(session, 1),
            KeyCode::PageUp => self.move_by(session, -(PAGE as isize)),
            KeyCode::PageDown => self.move_by(session, PAGE as isize),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = session.visible().len().saturating_sub(1),
            _ => return false,
        }
        true
    }

    fn handle_key(
        &mut self,
        session: &mut Session<'_>,
        key: KeyEvent,
        clipboard: &dyn Clipboard,
        download_dir: &Path,
    ) -> Flow {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Flow::Exit;
        }
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::Normal => return self.normal_key(session, key, clipboard, download_dir),
            Mode::Search => self.search_key(session, key),
            Mode::Preview(id) => self.preview_key(session, id, key, clipboard, download_dir),
            Mode::Compose(draft) => self.compose_key(session, draft, key),
        };
        Flow::Continue
    }

    fn normal_key(
        &mut self,
        session: &mut Session<'_>,
        key: KeyEvent,
        clipboard: &dyn Clipboard,
        download_dir: &Path,
    ) -> Flow {
        if self.navigate(session, key.code) {
            return Flow::Continue;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Exit,
            KeyCode::Char('k') => self.move_by(session, -1),
            KeyCode::Char('j') => self.move_by(session, 1),
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('c') => {
                session.view.cycle_category();
                self.selected = 0;
                self.pending_delete = None;
                let label = session.view.category.map(|k| k.as_str()).unwrap_or("all");
                self.notify(format!("Showing {}", label));
            }
            KeyCode::Char('s') => {
                session.view.sort = session.view.sort.toggled();
                self.selected = 0;
                self.notify(format!("Sorted {} first", session.view.sort));
            }
            KeyCode::Enter => {
                if let Some(clip) = self.current(session) {
                    self.copy(&clip, clipboard);
                }
            }
            KeyCode::Char('v') => {
                if let Some(clip) = self.current(session) {
                    self.mode = Mode::Preview(clip.id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(clip) = self.current(session) {
                    self.download(&clip, download_dir);
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(clip) = self.current(session) {
                    self.delete(session, clip.id);
                }
            }
            KeyCode::Char('n') => self.mode = Mode::Compose(Compose::new(ClipKind::Text)),
            KeyCode::Char('i') => self.mode = Mode::Compose(Compose::new(ClipKind::Image)),
            KeyCode::Char('r') => {
                if let Err(e) = session.reload() {
                    self.notify(format!("Reload failed: {}", e));
                }
                self.clamp(session);
            }
            _ => {}
        }
        Flow::Continue
    }

    fn search_key(&mut self, session: &mut Session<'_>, key: KeyEvent) -> Mode {
        if self.navigate(session, key.code) {
            return Mode::Search;
        }
        match key.code {
            KeyCode::Esc => {
                session.view.search.clear();
                self.selected = 0;
                Mode::Normal
            }
            KeyCode::Enter => Mode::Normal,
            KeyCode::Backspace => {
                session.view.search.pop();
                self.selected = 0;
                Mode::Search
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                session.view.search.push(ch);
                self.selected = 0;
                Mode::Search
            }
            _ => Mode::Search,
        }
    }

    fn preview_key(
        &mut self,
        session: &mut Session<'_>,
        id: ClipId,
        key: KeyEvent,
        clipboard: &dyn Clipboard,
        download_dir: &Path,
    ) -> Mode {
        let Some(clip) = session.get(id).cloned() else {
            return Mode::Normal;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('v') | KeyCode::Char('q') => return Mode::Normal,
            KeyCode::Enter => self.copy(&clip, clipboard),
            KeyCode::Char('d') => self.download(&clip, download_dir),
            _ => {}
        }
        Mode::Preview(id)
    }

    fn compose_key(&mut self, session: &mut Session<'_>, mut draft: Compose, key: KeyEvent) -> Mode {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Char('s') if ctrl => {
                if self.save_draft(session, &draft) {
                    return Mode::Normal;
                }
            }
            KeyCode::Tab => draft.next_field(),
            KeyCode::BackTab => draft.prev_field(),
            KeyCode::Enter => match (draft.field, draft.kind) {
                (Field::Body, ClipKind::Text) => draft.body.push('\n'),
                (Field::Body, ClipKind::Image) => draft.next_field(),
                _ => {
                    if self.save_draft(session, &draft) {
                        return Mode::Normal;
                    }
                }
            },
            KeyCode::Backspace => {
                draft.current().pop();
            }
            KeyCode::Char(ch) if !ctrl => draft.current().push(ch),
            _ => {}
        }
        Mode::Compose(draft)
    }
}

/// Drives the browser from `es`. With `draw = false` nothing touches the
/// terminal and the loop ends once the event source runs dry. Returns the
/// last copied clip id.
pub fn run_browser_with(
    session: &mut Session<'_>,
    clipboard: &dyn Clipboard,
    download_dir: &Path,
    theme: &TuiTheme,
    es: &mut dyn EventSource,
    draw: bool,
) -> Result<Option<ClipId>> {
    let mut state = Browser::new(theme);
    if !draw {
        while let Some(ev) = es.poll(Duration::from_millis(0))? {
            if let Flow::Exit = dispatch(&mut state, session, ev, clipboard, download_dir) {
                break;
            }
        }
        return Ok(state.last_copied);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let result = (|| -> Result<()> {
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        loop {
            terminal.draw(|f| draw_ui(f, &state, session))?;
            if let Some(ev) = es.poll(Duration::from_millis(100))? {
                if let Flow::Exit = dispatch(&mut state, session, ev, clipboard, download_dir) {
                    return Ok(());
                }
            }
        }
    })();
    disable_raw_mode()?;
    crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    result?;
    Ok(state.last_copied)
}

fn dispatch(
    state: &mut Browser<'_>,
    session: &mut Session<'_>,
    ev: Event,
    clipboard: &dyn Clipboard,
    download_dir: &Path,
) -> Flow {
    match ev {
        Event::Key(k) if k.kind == KeyEventKind::Press => {
            let flow = state.handle_key(session, k, clipboard, download_dir);
            state.clamp(session);
            flow
        }
        _ => Flow::Continue,
    }
}

fn centered_rect(pct_x: u16, pct_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn card(clip: &Clip) -> ListItem<'static> {
    let line1 = format!("#{} {} {}", clip.id, clip.kind, clip.preview(80));
    let mut meta = format!("Created {}", actions::rel_time(clip.created_at));
    if !clip.tags.is_empty() {
        meta.push_str(&format!(" | tags: {}", clip.tags.join(", ")));
    }
    if let Some(memo) = &clip.memo {
        meta.push_str(&format!(" | {}", memo));
    }
    ListItem::new(vec![
        Line::from(line1),
        Line::from(meta).style(Style::default().add_modifier(Modifier::DIM)),
    ])
}

fn draw_ui(f: &mut Frame<'_>, state: &Browser<'_>, session: &Session<'_>) {
    let thm = state.theme;
    let border = Style::default().fg(thm.border_fg);
    let searching = matches!(state.mode, Mode::Search) || !session.view.search.is_empty();
    let mut constraints = Vec::new();
    if searching {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(5));
    constraints.push(Constraint::Length(4));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());
    let (list_area, footer_area) = if searching {
        let q = Paragraph::new(session.view.search.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Search (Enter keep, Esc clear)")
                .border_style(border),
        );
        f.render_widget(q, chunks[0]);
        (chunks[1], chunks[2])
    } else {
        (chunks[0], chunks[1])
    };

    let visible = session.visible();
    let category = session.view.category.map(|k| k.as_str()).unwrap_or("all");
    let sort = match session.view.sort {
        SortOrder::Newest => "newest first",
        SortOrder::Oldest => "oldest first",
    };
    let title = format!("clipjar | {} | {} | {}/{}", category, sort, visible.len(), session.clips().len());
    let block = Block::default().borders(Borders::ALL).title(title).border_style(border);
    if visible.is_empty() {
        let msg = if session.clips().is_empty() {
            "No clips yet. Press n to add text or i to add an image."
        } else {
            "No clips match the current search or category."
        };
        f.render_widget(
            Paragraph::new(msg).block(block).wrap(Wrap { trim: true }),
            list_area,
        );
    } else {
        let items: Vec<ListItem> = visible.iter().map(|c| card(c)).collect();
        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .fg(thm.highlight_fg)
                .bg(thm.highlight_bg)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(
            list,
            list_area,
            &mut ListState::default().with_selected(Some(state.selected)),
        );
    }

    let ln1 = "/ search | c category | s sort | Enter copy | v preview | d download | x delete";
    let mut ln2 = String::from("n new text | i new image | r reload | Esc quit | ↑/↓/PgUp/PgDn move");
    if let Some((msg, until)) = &state.toast {
        if Instant::now() <= *until {
            ln2.push_str(&format!("  >> {}", msg));
        }
    }
    let footer = Paragraph::new(vec![Line::raw(ln1), Line::raw(ln2)])
        .block(Block::default().borders(Borders::ALL).title("Shortcuts").border_style(border))
        .style(Style::default().fg(thm.help_fg))
        .wrap(Wrap { trim: true });
    f.render_widget(footer, footer_area);

    match &state.mode {
        Mode::Preview(id) => {
            if let Some(clip) = session.get(*id) {
                let area = centered_rect(80, 80, f.area());
                f.render_widget(Clear, area);
                let body = Paragraph::new(actions::render_preview(clip))
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(format!("Preview #{} (Enter copy, d download, Esc close)", id))
                            .border_style(border),
                    )
                    .wrap(Wrap { trim: false });
                f.render_widget(body, area);
            }
        }
        Mode::Compose(draft) => draw_compose(f, draft, thm),
        Mode::Normal | Mode::Search => {}
    }
}

fn draw_compose(f: &mut Frame<'_>, draft: &Compose, thm: &TuiTheme) {
    let area = centered_rect(70, 60, f.area());
    f.render_widget(Clear, area);
    let title = match draft.kind {
        ClipKind::Text => "New text clip (Tab next field, Ctrl+S save, Esc cancel)",
        ClipKind::Image => "New image clip (Tab next field, Enter save, Esc cancel)",
    };
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(thm.border_fg));
    let inner = outer.inner(area);
    f.render_widget(outer, area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3), Constraint::Length(3)])
        .split(inner);
    let body_label = match draft.kind {
        ClipKind::Text => "Content",
        ClipKind::Image => "Image path",
    };
    let fields = [
        (Field::Body, body_label, &draft.body),
        (Field::Tags, "Tags (comma separated)", &draft.tags),
        (Field::Memo, "Memo", &draft.memo),
    ];
    for (i, (field, label, value)) in fields.into_iter().enumerate() {
        let style = if field == draft.field {
            Style::default().fg(thm.highlight_bg)
        } else {
            Style::default().fg(thm.border_fg)
        };
        let p = Paragraph::new(value.as_str())
            .block(Block::default().borders(Borders::ALL).title(label).border_style(style))
            .wrap(Wrap { trim: false });
        f.render_widget(p, rows[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copy_helpers::ImageRgba;
    use clipjar_core::ingest::encode_data_uri;
    use clipjar_core::{MemStore, Store, ViewState};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use tempfile::tempdir;

    struct FakeEvents {
        events: VecDeque<Event>,
    }

    impl FakeEvents {
        fn new(events: impl IntoIterator<Item = Event>) -> Self {
            Self {
                events: events.into_iter().collect(),
            }
        }
    }

    impl EventSource for FakeEvents {
        fn poll(&mut self, _timeout: Duration) -> Result<Option<Event>> {
            Ok(self.events.pop_front())
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        copied: RefCell<Vec<String>>,
    }

    impl Clipboard for RecordingClipboard {
        fn set_text(&self, text: &str) -> Result<()> {
            self.copied.borrow_mut().push(text.to_string());
            Ok(())
        }
        fn set_image(&self, img: &ImageRgba) -> Result<()> {
            self.copied
                .borrow_mut()
                .push(format!("image {}x{}", img.width, img.height));
            Ok(())
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn typed(s: &str) -> Vec<Event> {
        s.chars().map(|c| key(KeyCode::Char(c))).collect()
    }

    fn png_uri() -> String {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        encode_data_uri("image/png", &buf.into_inner())
    }

    fn run(store: &MemStore, events: Vec<Event>) -> (Option<ClipId>, Vec<String>) {
        let dir = tempdir().unwrap();
        run_in(store, dir.path(), events)
    }

    fn run_in(store: &MemStore, dir: &Path, events: Vec<Event>) -> (Option<ClipId>, Vec<String>) {
        let cb = RecordingClipboard::default();
        let mut session = Session::open(store, ViewState::default()).unwrap();
        let mut es = FakeEvents::new(events);
        let picked = run_browser_with(&mut session, &cb, dir, &TuiTheme::default(), &mut es, false)
            .unwrap();
        (picked, cb.copied.into_inner())
    }

    #[test]
    fn search_then_enter_copies_match() {
        let store = MemStore::new();
        let hello = store.save(NewClip::text("hello world")).unwrap();
        store.save(NewClip::text("second")).unwrap();
        let mut events = vec![key(KeyCode::Char('/'))];
        events.extend(typed("ELL"));
        events.push(key(KeyCode::Enter));
        events.push(key(KeyCode::Enter));
        let (picked, copied) = run(&store, events);
        assert_eq!(picked, Some(hello));
        assert_eq!(copied, vec!["hello world"]);
    }

    #[test]
    fn category_cycle_reaches_images() {
        let store = MemStore::new();
        let img = store.save(NewClip::image(png_uri())).unwrap();
        store.save(NewClip::text("newer text")).unwrap();
        let events = vec![
            key(KeyCode::Char('c')),
            key(KeyCode::Char('c')),
            key(KeyCode::Enter),
        ];
        let (picked, copied) = run(&store, events);
        assert_eq!(picked, Some(img));
        assert_eq!(copied, vec!["image 2x2"]);
    }

    #[test]
    fn sort_toggle_selects_oldest() {
        let store = MemStore::new();
        let first = store.save(NewClip::text("first")).unwrap();
        store.save(NewClip::text("second")).unwrap();
        let (picked, _) = run(&store, vec![key(KeyCode::Enter)]);
        assert_ne!(picked, Some(first));
        let (picked, _) = run(&store, vec![key(KeyCode::Char('s')), key(KeyCode::Enter)]);
        assert_eq!(picked, Some(first));
    }

    #[test]
    fn delete_needs_a_second_press() {
        let store = MemStore::new();
        store.save(NewClip::text("keep")).unwrap();
        let doomed = store.save(NewClip::text("doomed")).unwrap();

        run(&store, vec![key(KeyCode::Char('x'))]);
        assert_eq!(store.count().unwrap(), 2);

        run(&store, vec![key(KeyCode::Char('x')), key(KeyCode::Char('x'))]);
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.get(doomed).unwrap().is_none());
    }

    #[test]
    fn composer_saves_text_with_tags() {
        let store = MemStore::new();
        let mut events = vec![key(KeyCode::Char('n'))];
        events.extend(typed("hi there"));
        events.push(key(KeyCode::Tab));
        events.extend(typed("a, b"));
        events.push(key(KeyCode::Enter));
        run(&store, events);
        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "hi there");
        assert_eq!(all[0].tags, vec!["a", "b"]);
    }

    #[test]
    fn composer_rejects_empty_text() {
        let store = MemStore::new();
        let events = vec![
            key(KeyCode::Char('n')),
            key(KeyCode::Tab),
            key(KeyCode::Enter),
            key(KeyCode::Esc),
        ];
        run(&store, events);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn download_writes_selected_image() {
        let store = MemStore::new();
        let id = store.save(NewClip::image(png_uri())).unwrap();
        let dir = tempdir().unwrap();
        run_in(&store, dir.path(), vec![key(KeyCode::Char('d'))]);
        assert!(dir.path().join(format!("clip-{}.png", id)).exists());
    }

    #[test]
    fn esc_exits_before_later_events() {
        let store = MemStore::new();
        store.save(NewClip::text("x")).unwrap();
        let (picked, copied) = run(&store, vec![key(KeyCode::Esc), key(KeyCode::Enter)]);
        assert_eq!(picked, None);
        assert!(copied.is_empty());
    }

    #[test]
    fn preview_overlay_closes_with_esc() {
        let store = MemStore::new();
        let id = store.save(NewClip::text("peek")).unwrap();
        let events = vec![
            key(KeyCode::Char('v')),
            key(KeyCode::Esc),
            key(KeyCode::Enter),
        ];
        let (picked, _) = run(&store, events);
        assert_eq!(picked, Some(id));
    }
}

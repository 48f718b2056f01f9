//! TUI application state and logic

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::prelude::*;

use super::event::{Event, EventHandler};
use super::selector::{ClickOutcome, ClickTarget, Disclosure, TreeSelector};
use super::ui::Terminal;
use super::utils::viewport_offset;
use super::views;
use crate::domain::{DepartmentId, Forest};
use crate::form::{
    LocalSubmitter, RequestForm, RequestSubmitter, SubmitError, SubmitOutcome, SubmitTicket,
};
use crate::storage::Project;

/// Columns taken by the cursor marker in front of each tree row
pub const CURSOR_WIDTH: u16 = 2;

/// Which panel has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Service,
    Role,
    Tree,
    Submit,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Service => Focus::Role,
            Focus::Role => Focus::Tree,
            Focus::Tree => Focus::Submit,
            Focus::Submit => Focus::Service,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Service => Focus::Submit,
            Focus::Role => Focus::Service,
            Focus::Tree => Focus::Role,
            Focus::Submit => Focus::Tree,
        }
    }
}

/// Application state
pub struct App {
    /// Department hierarchy
    forest: Forest,

    /// Expansion state and cursor of the tree
    selector: TreeSelector,

    /// Form state, owner of the selected department
    form: RequestForm,

    /// Shared with submission workers
    submitter: Arc<dyn RequestSubmitter + Send + Sync>,

    /// Submission awaiting its worker's result
    in_flight: Option<SubmitTicket>,

    /// Current focus
    focus: Focus,

    /// Status message to display
    status_message: Option<String>,

    /// Whether to quit
    should_quit: bool,

    /// Where the tree panel was last drawn, for mouse hit-testing
    tree_area: Cell<Rect>,

    /// Where the submit button was last drawn
    submit_area: Cell<Rect>,
}

impl App {
    /// Create the application from a project's directory and request log
    pub fn new(project: &Project) -> Result<Self> {
        let directory = project.directory()?;
        let forest = directory.load_forest()?;
        let services = directory.list_services()?;
        let roles = directory.list_roles()?;

        let requester = project.requester();
        let pending = project.request_store().pending_service_ids(&requester)?;

        let form = RequestForm::new(services, roles, pending);
        let submitter = LocalSubmitter::new(project.root(), requester);
        let indent = project.config().project.tree.indent;

        Ok(Self::from_parts(forest, form, Arc::new(submitter), indent))
    }

    /// Create the application from already loaded state
    pub fn from_parts(
        forest: Forest,
        form: RequestForm,
        submitter: Arc<dyn RequestSubmitter + Send + Sync>,
        indent: u16,
    ) -> Self {
        let status_message = if forest.is_empty() {
            Some("No departments yet. Run `permit seed` first.".to_string())
        } else {
            None
        };

        Self {
            forest,
            selector: TreeSelector::new(indent),
            form,
            submitter,
            in_flight: None,
            focus: Focus::Service,
            status_message,
            should_quit: false,
            tree_area: Cell::new(Rect::default()),
            submit_area: Cell::new(Rect::default()),
        }
    }

    /// Run the main application loop
    pub fn run(&mut self, terminal: &mut Terminal, events: EventHandler) -> Result<()> {
        let tx = events.sender();

        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            let event = events.next()?;
            self.handle_event(event, &tx);
        }

        Ok(())
    }

    /// Draw the UI
    fn draw(&self, frame: &mut Frame) {
        views::form::draw(frame, self);
    }

    /// Dispatch one event
    pub fn handle_event(&mut self, event: Event, tx: &Sender<Event>) {
        match event {
            Event::Key(key) => self.handle_key(key, tx),
            Event::Mouse(mouse) => self.handle_mouse(mouse, tx),
            Event::Submitted(result) => self.finish_submission(result),
            // Terminal handles resize automatically
            Event::Resize(_, _) | Event::Tick => {}
        }
    }

    /// Handle key events
    fn handle_key(&mut self, key: KeyEvent, tx: &Sender<Event>) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
            }
            KeyCode::Char('s') => {
                self.start_submission(tx);
            }
            KeyCode::Char('x') => {
                self.form.clear_department();
            }
            KeyCode::Char('?') => {
                self.status_message = Some(
                    "Tab:focus j/k:move Enter:select o:toggle e/c:expand/collapse all s:submit x:clear q:quit"
                        .to_string(),
                );
            }
            _ => match self.focus {
                Focus::Service => self.handle_service_key(key),
                Focus::Role => self.handle_role_key(key),
                Focus::Tree => self.handle_tree_key(key),
                Focus::Submit => {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                        self.start_submission(tx);
                    }
                }
            },
        }
    }

    fn handle_service_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.form.cycle_service(true),
            KeyCode::Char('k') | KeyCode::Up => self.form.cycle_service(false),
            _ => {}
        }
    }

    fn handle_role_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.form.cycle_role(true),
            KeyCode::Char('k') | KeyCode::Up => self.form.cycle_role(false),
            _ => {}
        }
    }

    fn handle_tree_key(&mut self, key: KeyEvent) {
        let rows = self.selector.rows(&self.forest, None);
        let row_count = rows.len();
        let Some(row) = rows.get(self.selector.cursor()) else {
            return;
        };
        let id = row.id().clone();
        let disclosure = row.disclosure;
        let depth = row.depth;
        let parent_row = rows[..self.selector.cursor()]
            .iter()
            .rposition(|r| r.depth + 1 == depth);

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.selector.move_cursor(1, row_count),
            KeyCode::Char('k') | KeyCode::Up => self.selector.move_cursor(-1, row_count),
            KeyCode::Enter | KeyCode::Char(' ') => self.click_tree(&id, ClickTarget::Row),
            KeyCode::Char('o') => self.click_tree(&id, ClickTarget::Disclosure),
            KeyCode::Char('e') => {
                self.selector.expand_all(&self.forest);
                self.move_cursor_to(&id);
            }
            KeyCode::Char('c') => self.selector.collapse_all(),
            KeyCode::Char('l') | KeyCode::Right => {
                if disclosure == Disclosure::Collapsed {
                    self.click_tree(&id, ClickTarget::Disclosure);
                }
            }
            KeyCode::Char('h') | KeyCode::Left => {
                if disclosure == Disclosure::Expanded {
                    self.click_tree(&id, ClickTarget::Disclosure);
                } else if let Some(parent) = parent_row {
                    let delta = parent as isize - self.selector.cursor() as isize;
                    self.selector.move_cursor(delta, row_count);
                }
            }
            _ => {}
        }
    }

    /// Handle mouse presses on the tree and the submit button
    fn handle_mouse(&mut self, mouse: MouseEvent, tx: &Sender<Event>) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let position = Position::new(mouse.column, mouse.row);

        if self.submit_area.get().contains(position) {
            self.focus = Focus::Submit;
            self.start_submission(tx);
            return;
        }

        if let Some((row_index, id, target)) = self.tree_hit(position) {
            self.focus = Focus::Tree;
            let row_count = self.selector.rows(&self.forest, None).len();
            let delta = row_index as isize - self.selector.cursor() as isize;
            self.selector.move_cursor(delta, row_count);
            self.click_tree(&id, target);
        }
    }

    /// Maps a screen position to a tree row and click target
    fn tree_hit(&self, position: Position) -> Option<(usize, DepartmentId, ClickTarget)> {
        let inner = self.tree_area.get().inner(Margin::new(1, 1));
        if !inner.contains(position) {
            return None;
        }

        let rows = self.selector.rows(&self.forest, None);
        let offset = viewport_offset(self.selector.cursor(), inner.height as usize);
        let row_index = offset + (position.y - inner.y) as usize;

        let content_x = inner.x + CURSOR_WIDTH;
        if position.x < content_x {
            let row = rows.get(row_index)?;
            return Some((row_index, row.id().clone(), ClickTarget::Row));
        }

        let (id, target) = self
            .selector
            .hit_test(&rows, row_index, position.x - content_x)?;
        Some((row_index, id, target))
    }

    /// Puts the cursor on the row showing `id`, if it is visible
    fn move_cursor_to(&mut self, id: &DepartmentId) {
        let (index, row_count) = {
            let rows = self.selector.rows(&self.forest, None);
            (rows.iter().position(|row| row.id() == id), rows.len())
        };
        if let Some(index) = index {
            let delta = index as isize - self.selector.cursor() as isize;
            self.selector.move_cursor(delta, row_count);
        }
    }

    fn click_tree(&mut self, id: &DepartmentId, target: ClickTarget) {
        let form = &mut self.form;
        let outcome = self
            .selector
            .click(&self.forest, id, target, |selected| form.set_department(selected));

        if let ClickOutcome::Toggled { expanded: false } = outcome {
            let row_count = self.selector.rows(&self.forest, None).len();
            self.selector.clamp_cursor(row_count);
        }
    }

    /// Starts a submission on a worker thread; the result comes back as an event
    fn start_submission(&mut self, tx: &Sender<Event>) {
        let Some(ticket) = self.form.begin_submit() else {
            if self.form.is_busy() {
                self.status_message = Some("A submission is already in progress".to_string());
            } else if self.form.department_id().is_none() {
                self.status_message = Some("Select a department first".to_string());
            } else {
                self.status_message = Some("Select a service and a role".to_string());
            }
            return;
        };

        self.status_message = None;
        self.in_flight = Some(ticket.clone());

        let submitter = Arc::clone(&self.submitter);
        let tx = tx.clone();
        thread::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                submitter.submit(
                    &ticket.service_id,
                    &ticket.role_id,
                    Some(&ticket.department_id),
                )
            }))
            .unwrap_or(Err(SubmitError::Disconnected));
            // Receiver is gone only when the UI has exited
            let _ = tx.send(Event::Submitted(result));
        });
    }

    fn finish_submission(&mut self, result: Result<SubmitOutcome, SubmitError>) {
        if let Some(ticket) = self.in_flight.take() {
            self.form.finish_submit(&ticket, result);
        }
    }

    // Accessors for views

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn selector(&self) -> &TreeSelector {
        &self.selector
    }

    pub fn form(&self) -> &RequestForm {
        &self.form
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_tree_area(&self, area: Rect) {
        self.tree_area.set(area);
    }

    pub fn set_submit_area(&self, area: Rect) {
        self.submit_area.set(area);
    }
}

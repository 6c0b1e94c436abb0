use crate::commands::Action;
use crate::config::{Config, UiConfig};
use crate::db::Database;
use crate::event::{Event, EventHandler};
use crate::inventory::{
  export, ExportFormat, InventoryStore, LoadOutcome, SqliteSlot, StoreError,
};
use crate::ui;
use crate::ui::components::{Banner, BannerKind, CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{InventoryView, PhoneFormView};
use chrono::Local;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// State shared by every view: the inventory and the status banner
pub struct Session {
  store: InventoryStore<SqliteSlot>,
  ui: UiConfig,
  banner: Option<Banner>,
}

impl Session {
  pub fn new(store: InventoryStore<SqliteSlot>, ui: UiConfig) -> Self {
    Self {
      store,
      ui,
      banner: None,
    }
  }

  pub fn store(&self) -> &InventoryStore<SqliteSlot> {
    &self.store
  }

  pub fn store_mut(&mut self) -> &mut InventoryStore<SqliteSlot> {
    &mut self.store
  }

  pub fn max_image_bytes(&self) -> u64 {
    self.ui.max_image_bytes
  }

  /// Show a banner, replacing the current one
  pub fn notify(&mut self, kind: BannerKind, text: impl Into<String>) {
    self.banner = Some(Banner::new(kind, text));
  }

  pub fn banner(&self) -> Option<&Banner> {
    self.banner.as_ref()
  }

  /// Drop the banner once it has been up for the configured time
  pub fn expire_banner(&mut self, now: Instant) {
    let ttl = Duration::from_secs(self.ui.banner_seconds);
    if self.banner.as_ref().is_some_and(|b| b.is_expired(now, ttl)) {
      self.banner = None;
    }
  }

  pub fn report_load(&mut self, outcome: &LoadOutcome) {
    match outcome {
      LoadOutcome::Fresh => {
        self.notify(BannerKind::Info, "No phones yet, press a to add one")
      }
      LoadOutcome::Loaded(count) => {
        self.notify(BannerKind::Info, format!("Loaded {} phones", count))
      }
      LoadOutcome::Unreadable { reason } => self.notify(
        BannerKind::Error,
        format!(
          "Saved inventory could not be read ({}); starting empty, the next change overwrites it",
          reason
        ),
      ),
      LoadOutcome::DuplicateImeis { count, imeis } => self.notify(
        BannerKind::Warning,
        format!(
          "Loaded {} phones, but IMEI {} is on more than one record",
          count,
          imeis.iter().map(|i| i.as_str()).collect::<Vec<_>>().join(", ")
        ),
      ),
    }
  }

  /// Tell the user why a change failed or was not saved
  pub fn report_error(&mut self, err: &StoreError) {
    match err {
      StoreError::Storage(_) => self.notify(
        BannerKind::Warning,
        format!("{}. Press w to retry", err),
      ),
      _ => self.notify(BannerKind::Error, err.to_string()),
    }
  }

  /// Write an export named after today's date into the export directory
  pub fn export(&mut self, format: ExportFormat) {
    let date = Local::now().date_naive();
    match export::write_export(&self.ui.export_dir, format, self.store.records(), date) {
      Ok(path) => self.notify(
        BannerKind::Success,
        format!("Exported {} phones to {}", self.store.len(), path.display()),
      ),
      Err(e) => {
        warn!(error = %e, "Export failed");
        self.notify(BannerKind::Error, format!("Export failed: {}", e));
      }
    }
  }

  /// Write the inventory again after a failed save
  pub fn retry_write(&mut self) {
    if !self.store.is_dirty() {
      self.notify(BannerKind::Info, "All changes are saved");
      return;
    }
    match self.store.persist() {
      Ok(()) => self.notify(BannerKind::Success, "Inventory saved"),
      Err(e) => self.report_error(&e),
    }
  }
}

/// Main application state
pub struct App {
  session: Session,

  /// Navigation stack - root is always at index 0
  views: Vec<Box<dyn View>>,

  /// Command palette (after pressing :)
  command: CommandInput,

  should_quit: bool,
}

impl App {
  pub fn new(config: Config, db: Arc<Database>) -> Self {
    let slot = SqliteSlot::new(db, &config.storage.slot_key);
    let (store, outcome) = InventoryStore::open(slot);
    let mut session = Session::new(store, config.ui);
    session.report_load(&outcome);

    Self {
      session,
      views: vec![Box::new(InventoryView::new())],
      command: CommandInput::new(),
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let result = match Terminal::new(CrosstermBackend::new(stdout())) {
      Ok(mut terminal) => self.event_loop(&mut terminal).await,
      Err(e) => Err(e.into()),
    };

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(250));

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, &mut self.views, &self.session, &self.command))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.session.expire_banner(Instant::now()),
        Some(Event::Resize) => {}
        None => break,
      }
    }

    if self.session.store().is_dirty() {
      warn!("Quitting with unsaved inventory changes");
    }
    Ok(())
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The palette only opens while no view is taking text
    let capturing = self.views.last().is_some_and(|v| v.captures_input());
    if !capturing || self.command.is_active() {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Run(action)) => return self.run_action(action),
        KeyResult::Event(CommandEvent::Unknown(input)) => {
          self
            .session
            .notify(BannerKind::Error, format!("Unknown command: {}", input));
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let Some(view) = self.views.last_mut() else {
      self.should_quit = true;
      return;
    };
    let action = view.handle_key(key, &mut self.session);
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.views.push(view),
      ViewAction::Pop => {
        self.views.pop();
        if self.views.is_empty() {
          self.should_quit = true;
        }
      }
      ViewAction::Quit => self.should_quit = true,
    }
  }

  fn run_action(&mut self, action: Action) {
    match action {
      Action::AddPhone => self.apply(ViewAction::Push(Box::new(PhoneFormView::add()))),
      Action::ExportJson => self.session.export(ExportFormat::Json),
      Action::ExportCsv => self.session.export(ExportFormat::Csv),
      Action::RetryWrite => self.session.retry_write(),
      Action::Quit => self.should_quit = true,
    }
  }
}

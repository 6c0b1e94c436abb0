//! Scriptable subcommands over the inventory and the shell cache.

use chrono::Local;
use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::inventory::{
  export, image, Confirmation, ExportFormat, InventoryStore, LoadOutcome, NewPhone, PhoneRecord,
  PhoneUpdate, Ram, RecordId, SqliteSlot, Storage,
};
use crate::shell::{HttpNetwork, Request, SqliteCacheStore, ShellWorker};

#[derive(Subcommand, Debug)]
pub enum Command {
  #[command(flatten)]
  Inventory(InventoryCommand),
  /// Manage the offline shell cache
  Shell {
    #[command(subcommand)]
    command: ShellCommand,
  },
}

#[derive(Subcommand, Debug)]
pub enum InventoryCommand {
  /// Add a phone to the inventory
  Add {
    #[arg(long)]
    brand: String,
    #[arg(long)]
    model: String,
    /// 15-digit IMEI
    #[arg(long)]
    imei: String,
    #[arg(long)]
    ram: Ram,
    #[arg(long)]
    storage: Storage,
    /// Photo of the phone
    #[arg(long)]
    image: Option<PathBuf>,
  },
  /// Change fields of a phone
  Edit {
    id: RecordId,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    imei: Option<String>,
    #[arg(long)]
    ram: Option<Ram>,
    #[arg(long)]
    storage: Option<Storage>,
    #[arg(long, conflicts_with = "clear_image")]
    image: Option<PathBuf>,
    /// Remove the stored photo
    #[arg(long)]
    clear_image: bool,
  },
  /// Mark a phone as sold
  Sell {
    id: RecordId,
    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,
  },
  /// Remove a phone from the inventory
  Delete {
    id: RecordId,
    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,
  },
  /// List phones, optionally filtered by brand, model or IMEI
  List {
    query: Option<String>,
    /// Print the matching records as JSON
    #[arg(long)]
    json: bool,
  },
  /// Show inventory counts
  Stats,
  /// Write the inventory to a dated file
  Export {
    #[arg(value_enum)]
    format: ExportFormat,
    /// Directory to write into
    #[arg(long, default_value = ".")]
    out: PathBuf,
  },
}

#[derive(Subcommand, Debug)]
pub enum ShellCommand {
  /// Cache every manifest resource in the current generation
  Install,
  /// Delete every generation but the current one
  Activate,
  /// List cache generations
  Status,
  /// Fetch a URL through the cache
  Fetch {
    url: String,
    /// Treat the request as a page navigation
    #[arg(long)]
    navigate: bool,
    /// Write the response body to stdout
    #[arg(long)]
    body: bool,
  },
  /// Trigger a background sync
  Sync { tag: String },
  /// Show the notification a push payload would produce
  Push {
    /// JSON payload with optional `title` and `body`
    #[arg(default_value = "")]
    payload: String,
  },
}

pub async fn run(command: Command, config: &Config, db: Arc<Database>) -> Result<()> {
  match command {
    Command::Inventory(command) => run_inventory(command, config, db),
    Command::Shell { command } => run_shell(command, config, db).await,
  }
}

fn open_store(config: &Config, db: Arc<Database>) -> InventoryStore<SqliteSlot> {
  let (store, outcome) = InventoryStore::open(SqliteSlot::new(db, &config.storage.slot_key));
  match outcome {
    LoadOutcome::Unreadable { reason } => eprintln!(
      "warning: stored inventory is unreadable ({}); starting empty, the next change overwrites it",
      reason
    ),
    LoadOutcome::DuplicateImeis { imeis, .. } => eprintln!(
      "warning: IMEI {} is on more than one record",
      imeis.iter().map(|i| i.as_str()).collect::<Vec<_>>().join(", ")
    ),
    LoadOutcome::Fresh | LoadOutcome::Loaded(_) => {}
  }
  store
}

fn run_inventory(command: InventoryCommand, config: &Config, db: Arc<Database>) -> Result<()> {
  let mut store = open_store(config, db);

  match command {
    InventoryCommand::Add {
      brand,
      model,
      imei,
      ram,
      storage,
      image,
    } => {
      let image = image
        .map(|path| image::load_data_url(&path, config.ui.max_image_bytes))
        .transpose()?;
      let record = store.add(NewPhone {
        brand,
        model,
        imei,
        ram,
        storage,
        image,
      })?;
      println!(
        "Added {} {} (id {})",
        record.brand, record.model, record.id
      );
    }
    InventoryCommand::Edit {
      id,
      brand,
      model,
      imei,
      ram,
      storage,
      image,
      clear_image,
    } => {
      let image = image
        .map(|path| image::load_data_url(&path, config.ui.max_image_bytes))
        .transpose()?;
      let update = PhoneUpdate {
        brand,
        model,
        imei,
        ram,
        storage,
        image,
        clear_image,
      };
      if update.is_empty() {
        return Err(eyre!("Nothing to change"));
      }
      let record = store
        .update(id, update)?
        .ok_or_else(|| eyre!("No phone with id {}", id))?;
      println!("Updated {} {} (id {})", record.brand, record.model, record.id);
    }
    InventoryCommand::Sell { id, yes } => {
      let record = store
        .get(id)
        .ok_or_else(|| eyre!("No phone with id {}", id))?;
      if record.sold {
        println!("{} {} is already sold", record.brand, record.model);
        return Ok(());
      }
      let prompt = format!("Mark {} {} as sold?", record.brand, record.model);
      let Some(confirmation) = confirm(&prompt, yes)? else {
        println!("Cancelled");
        return Ok(());
      };
      if let Some(record) = store.mark_sold(id, confirmation)? {
        println!("Marked {} {} as sold", record.brand, record.model);
      }
    }
    InventoryCommand::Delete { id, yes } => {
      let record = store
        .get(id)
        .ok_or_else(|| eyre!("No phone with id {}", id))?;
      let prompt = format!(
        "Delete {} {} (IMEI {})?",
        record.brand, record.model, record.imei
      );
      let Some(confirmation) = confirm(&prompt, yes)? else {
        println!("Cancelled");
        return Ok(());
      };
      if let Some(record) = store.delete(id, confirmation)? {
        println!("Deleted {} {}", record.brand, record.model);
      }
    }
    InventoryCommand::List { query, json } => {
      let records = store.find(query.as_deref().unwrap_or(""));
      if json {
        let owned: Vec<PhoneRecord> = records.into_iter().cloned().collect();
        println!("{}", export::to_json(&owned)?);
      } else if records.is_empty() {
        println!("No phones found");
      } else {
        print_table(&records);
      }
    }
    InventoryCommand::Stats => {
      let stats = store.stats();
      println!("Total:     {}", stats.total);
      println!("Available: {}", stats.available);
      println!("Sold:      {}", stats.sold);
    }
    InventoryCommand::Export { format, out } => {
      let path = export::write_export(&out, format, store.records(), Local::now().date_naive())?;
      println!("Wrote {}", path.display());
    }
  }

  Ok(())
}

async fn run_shell(command: ShellCommand, config: &Config, db: Arc<Database>) -> Result<()> {
  let base = config.shell.base_url()?;
  let network = HttpNetwork::new(&base, config.shell.timeout())?;
  let worker = ShellWorker::new(&config.shell, SqliteCacheStore::new(db), network)?;

  match command {
    ShellCommand::Install => {
      let report = worker.install().await?;
      println!(
        "Installed {} ({} resources)",
        report.generation, report.cached
      );
    }
    ShellCommand::Activate => {
      let report = worker.activate()?;
      if report.deleted.is_empty() {
        println!("{} is active, nothing to clean up", report.current);
      } else {
        println!(
          "{} is active, deleted {}",
          report.current,
          report.deleted.join(", ")
        );
      }
    }
    ShellCommand::Status => {
      let generations = worker.status()?;
      if generations.is_empty() {
        println!("No cache generations (current would be {})", worker.generation());
      }
      for generation in generations {
        let marker = if generation.current { "*" } else { " " };
        let state = if generation.complete { "" } else { " (incomplete)" };
        println!(
          "{} {:<24} {:>4} entries{}",
          marker, generation.name, generation.entries, state
        );
      }
    }
    ShellCommand::Fetch {
      url,
      navigate,
      body,
    } => {
      let url = worker.resolve(&url)?;
      let request = if navigate {
        Request::navigate(url)
      } else {
        Request::resource(url)
      };
      let outcome = worker.fetch(&request).await?;
      // Let the cache write land before the process exits
      if let Some(refill) = outcome.refill {
        refill.await?;
      }
      let response = &outcome.response;
      eprintln!(
        "{} {} from {:?} ({}, {} bytes)",
        response.status,
        response.response_type,
        outcome.source,
        response.content_type.as_deref().unwrap_or("unknown type"),
        response.body.len()
      );
      if body {
        io::stdout().write_all(&response.body)?;
      }
    }
    ShellCommand::Sync { tag } => {
      worker.sync(&tag);
      println!("Sync '{}' triggered", tag);
    }
    ShellCommand::Push { payload } => {
      let notification = worker.push(&payload)?;
      println!("{}", serde_json::to_string_pretty(&notification)?);
    }
  }

  Ok(())
}

/// Ask a yes/no question on stdin unless `assume_yes` is set.
fn confirm(prompt: &str, assume_yes: bool) -> Result<Option<Confirmation>> {
  if assume_yes {
    return Ok(Some(Confirmation::by_user()));
  }

  eprint!("{} [y/N] ", prompt);
  io::stderr().flush()?;
  let mut answer = String::new();
  io::stdin().lock().read_line(&mut answer)?;

  Ok(is_yes(&answer).then(Confirmation::by_user))
}

fn is_yes(answer: &str) -> bool {
  matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_table(records: &[&PhoneRecord]) {
  println!(
    "{:<14} {:<12} {:<20} {:<15} {:<5} {:<6} {:<9} {}",
    "ID", "BRAND", "MODEL", "IMEI", "RAM", "STORE", "STATUS", "ADDED"
  );
  for record in records {
    println!(
      "{:<14} {:<12} {:<20} {:<15} {:<5} {:<6} {:<9} {}",
      record.id,
      record.brand,
      record.model,
      record.imei,
      record.ram,
      record.storage,
      record.status_label(),
      record.id.added_date()
    );
  }
}

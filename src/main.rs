use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::path::{Path, PathBuf};
use std::{env, io};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use tasktide::app::App;
use tasktide::config::{self, Config};
use tasktide::storage::{FileStore, KeyValueStore, MemoryStore};
use tasktide::task_store::TaskStore;
use tasktide::{theme, ui};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_error) = match config::load_config() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    let data_dir = config.data_dir(env::var_os(config::DATA_DIR_ENV).map(PathBuf::from));
    let _log_guard = init_logging(&config, &data_dir);
    info!(data_dir = %data_dir.display(), "starting tasktide");
    if let Some(err) = &config_error {
        warn!(error = %err, "ignoring invalid config, using defaults");
    }

    let mut fallback_notice = None;
    let storage: Box<dyn KeyValueStore> = match FileStore::open(&data_dir) {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(error = %err, "data directory unavailable, changes will not be saved");
            fallback_notice = Some(format!("Changes will not be saved: {err}"));
            Box::new(MemoryStore::new())
        }
    };
    let system_dark = config
        .theme
        .dark
        .unwrap_or_else(|| theme::detect_system_dark(env::var("COLORFGBG").ok().as_deref()));
    let dark_mode = theme::load_dark_mode(storage.as_ref(), system_dark);
    let mut app = App::new(TaskStore::load(storage), dark_mode);
    if let Some(message) = fallback_notice {
        app.notices.error(message);
    }

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("{:?}", err);
    }
    info!("tasktide exited");
    Ok(())
}

/// Logs go to `<data_dir>/tasktide.log`; stdout belongs to the terminal UI.
fn init_logging(config: &Config, data_dir: &Path) -> Option<WorkerGuard> {
    std::fs::create_dir_all(data_dir).ok()?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("tasktide")
        .filename_suffix("log")
        .build(data_dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.as_str()));
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
    Some(guard)
}

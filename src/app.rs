use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::ui::{UserTableView, ViewAction};
use crate::users::CachedUserClient;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;

/// Main application: owns the terminal, the event loop, and the user
/// table view.
pub struct App {
  view: UserTableView,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, initial_page: usize) -> Result<Self> {
    let client = CachedUserClient::new(&config)?;

    // Warm the cache ahead of the first render
    client.prefetch();

    let view = UserTableView::new(client, &config, initial_page);

    Ok(Self {
      view,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main loop
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| {
        let area = frame.area();
        self.view.render(frame, area);
      })?;

      // Handle events
      if let Some(event) = events.next().await {
        match event {
          Event::Key(key) => {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
              self.should_quit = true;
            } else if self.view.handle_key(key) == ViewAction::Quit {
              self.should_quit = true;
            }
          }
          Event::Tick => self.view.tick(),
        }
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }
}

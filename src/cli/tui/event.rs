//! Event handling for the TUI

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind,
};

use crate::form::{SubmitError, SubmitOutcome};

/// Terminal and worker events
#[derive(Debug)]
pub enum Event {
    /// Key press event
    Key(KeyEvent),
    /// Mouse button press
    Mouse(MouseEvent),
    /// Terminal resize event (width, height)
    Resize(u16, u16),
    /// Tick event for periodic updates
    Tick,
    /// A submission worker finished
    Submitted(Result<SubmitOutcome, SubmitError>),
}

/// Handles terminal events in a separate thread
pub struct EventHandler {
    /// Event receiver
    rx: mpsc::Receiver<Event>,
    /// Kept for handing out to worker threads
    tx: mpsc::Sender<Event>,
}

impl EventHandler {
    /// Create a new event handler with the given tick rate in milliseconds
    pub fn new(tick_rate_ms: u64) -> Self {
        let tick_rate = Duration::from_millis(tick_rate_ms);
        let (tx, rx) = mpsc::channel();
        let tx_clone = tx.clone();

        thread::spawn(move || loop {
            if event::poll(tick_rate).unwrap_or(false) {
                let forwarded = match event::read() {
                    // Only presses, not releases
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Some(Event::Key(key))
                    }
                    Ok(CrosstermEvent::Mouse(mouse))
                        if matches!(mouse.kind, MouseEventKind::Down(_)) =>
                    {
                        Some(Event::Mouse(mouse))
                    }
                    Ok(CrosstermEvent::Resize(w, h)) => Some(Event::Resize(w, h)),
                    _ => None,
                };

                if let Some(evt) = forwarded {
                    if tx_clone.send(evt).is_err() {
                        break;
                    }
                }
            } else if tx_clone.send(Event::Tick).is_err() {
                break;
            }
        });

        Self { rx, tx }
    }

    /// Sender for background workers reporting back to the loop
    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.tx.clone()
    }

    /// Receive the next event (blocking)
    pub fn next(&self) -> Result<Event> {
        Ok(self.rx.recv()?)
    }
}

//! The polling loop that keeps the display in sync with upstream stop data.

use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use crate::display::{Display, DisplayError, GroupHandle, TextNodeId, create_text};
use crate::transit::{StopGroups, StopSource, TransitAgency};

pub const LOADING_TEXT: &str = "LOADING";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Still showing the placeholder; no refresh has succeeded yet.
    Loading,
    Displaying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The refresh interval has not elapsed since the last attempt.
    Skipped,
    Refreshed,
    /// The attempt failed; the previous text is still on screen.
    Failed,
}

/// Which stations to poll and how often.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub agency: TransitAgency,
    pub parent_stations: Vec<String>,
    pub refresh_interval: Duration,
    pub tick_interval: Duration,
}

/// Polls a [`StopSource`] and swaps the formatted result onto a [`Display`].
///
/// Strictly sequential: a tick awaits its refresh before returning, so two
/// refreshes are never in flight at once.
pub struct RefreshLoop<S> {
    source: S,
    display: Display,
    group: GroupHandle,
    text: TextNodeId,
    settings: RefreshSettings,
    last_update: Option<Instant>,
    state: LoopState,
}

impl<S: StopSource> RefreshLoop<S> {
    /// Puts the loading placeholder on `display` and prepares the loop.
    ///
    /// Fails only if the display cannot hold a group at its origin.
    pub fn new(source: S, mut display: Display, settings: RefreshSettings) -> Result<Self, DisplayError> {
        let group = display.create_group(0, 0)?;
        let text = display.append(group, create_text(LOADING_TEXT))?;
        display.render();

        Ok(Self {
            source,
            display,
            group,
            text,
            settings,
            last_update: None,
            state: LoopState::Loading,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// The text currently attached to the loop's display group.
    pub fn displayed_text(&self) -> &str {
        self.display
            .children(self.group)
            .ok()
            .and_then(|nodes| nodes.iter().find(|n| n.id() == self.text))
            .map(|n| n.text())
            .unwrap_or_default()
    }

    /// Runs one polling step at time `now`.
    ///
    /// A refresh happens on the first tick and then whenever a full refresh
    /// interval has passed since the previous attempt, successful or not.
    pub async fn tick(&mut self, now: Instant) -> TickOutcome {
        if let Some(last) = self.last_update {
            if now.saturating_duration_since(last) < self.settings.refresh_interval {
                return TickOutcome::Skipped;
            }
        }
        self.last_update = Some(now);

        match self.refresh().await {
            Ok(()) => TickOutcome::Refreshed,
            Err(e) => {
                error!(error = %e, "Refresh failed, keeping previous display");
                TickOutcome::Failed
            }
        }
    }

    /// Ticks forever at the configured tick interval.
    pub async fn run(mut self) {
        info!(
            agency = %self.settings.agency,
            stations = ?self.settings.parent_stations,
            refresh_secs = self.settings.refresh_interval.as_secs(),
            "Refresh loop started"
        );

        let mut ticker = tokio::time::interval(self.settings.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let now = ticker.tick().await.into_std();
            if self.tick(now).await == TickOutcome::Refreshed {
                let frame = self.display.render();
                debug!(lit_pixels = frame.lit_pixels(), "Frame rendered\n{}", frame.to_ascii());
            }
        }
    }

    #[instrument(skip_all, fields(agency = %self.settings.agency))]
    async fn refresh(&mut self) -> anyhow::Result<()> {
        let groups = self
            .source
            .stops_for_parent_stations(self.settings.agency, &self.settings.parent_stations)
            .await?;

        let text = format_stop_groups(&groups);
        self.text = self.display.replace(self.group, self.text, create_text(text))?;
        self.state = LoopState::Displaying;

        info!(
            stations = groups.len(),
            stops = groups.stop_count(),
            "Display refreshed"
        );
        Ok(())
    }
}

/// Formats grouped stops for the board:
///
/// ```text
/// menlo_park:
///   70161
///   70162
///
/// palo_alto:
///   70171
/// ```
pub fn format_stop_groups(groups: &StopGroups) -> String {
    groups
        .iter()
        .map(|(station, stops)| {
            let mut block = format!("{station}:");
            for stop in stops {
                block.push_str(&format!("\n  {}", stop.id));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

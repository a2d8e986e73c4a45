//! Presentation sinks and the per-selection map surface.
//!
//! The core never draws anything itself. A [`Presenter`] forwards proximity tables to a
//! map surface and daylight series to a chart. Each reference selection gets its own
//! [`RenderSession`] which owns the map surface and releases it when dropped, so the
//! old surface is always torn down before the next one is created.

use crate::proximity::ProximityTable;
use crate::{DayRecord, Place, ProximityRecord, RenderMode};
use log::debug;

/// A drawable map surface.
pub trait MapSink: Send {
    /// Draws `records` around `reference` in the given mode.
    fn render_map(&mut self, reference: &Place, records: &[ProximityRecord], mode: RenderMode);

    /// Frees the surface; called once when its session ends.
    fn release(&mut self) {}
}

/// Creates a fresh map surface for each reference selection.
pub trait MapSurfaceFactory: Send {
    /// New surface centred on `reference`.
    fn create_surface(&mut self, reference: &Place) -> Box<dyn MapSink>;
}

impl<F> MapSurfaceFactory for F
where
    F: FnMut(&Place) -> Box<dyn MapSink> + Send,
{
    fn create_surface(&mut self, reference: &Place) -> Box<dyn MapSink> {
        self(reference)
    }
}

/// Time-series chart of a daylight series.
pub trait ChartSink: Send {
    /// Draws one point per day.
    fn render_chart(&mut self, days: &[DayRecord]);
}

/// Map surface bound to one reference place.
pub struct RenderSession {
    reference: Place,
    surface: Box<dyn MapSink>,
}

impl RenderSession {
    /// Session owning `surface` for `reference`.
    #[must_use]
    pub fn new(reference: Place, surface: Box<dyn MapSink>) -> Self {
        debug!("opening map surface for `{}`", reference.name());
        Self { reference, surface }
    }

    /// Place this session was opened for.
    #[must_use]
    pub const fn reference(&self) -> &Place {
        &self.reference
    }

    /// Draws the records, truncated to the mode's record limit.
    pub fn render(&mut self, records: &[ProximityRecord], mode: RenderMode) {
        let shown = mode
            .record_limit()
            .map_or(records, |limit| &records[..limit.min(records.len())]);
        self.surface.render_map(&self.reference, shown, mode);
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        debug!("releasing map surface for `{}`", self.reference.name());
        self.surface.release();
    }
}

impl core::fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderSession")
            .field("reference", &self.reference.name())
            .finish_non_exhaustive()
    }
}

/// Routes pipeline results to the map and chart sinks.
pub struct Presenter {
    factory: Box<dyn MapSurfaceFactory>,
    chart: Box<dyn ChartSink>,
    session: Option<RenderSession>,
    mode: RenderMode,
}

impl Presenter {
    /// Presenter drawing maps on surfaces from `factory` and series on `chart`.
    #[must_use]
    pub fn new(factory: impl MapSurfaceFactory + 'static, chart: impl ChartSink + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            chart: Box::new(chart),
            session: None,
            mode: RenderMode::default(),
        }
    }

    /// Current map mode.
    #[must_use]
    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Changes the map mode used from the next render on.
    pub fn set_mode(&mut self, mode: RenderMode) {
        self.mode = mode;
    }

    /// The active session, if a reference has been shown.
    #[must_use]
    pub const fn session(&self) -> Option<&RenderSession> {
        self.session.as_ref()
    }

    /// Ends the current session and opens one for `reference`.
    pub fn begin_session(&mut self, reference: &Place) -> &mut RenderSession {
        // Release the old surface before asking for a new one.
        self.session = None;
        let surface = self.factory.create_surface(reference);
        self.session.insert(RenderSession::new(reference.clone(), surface))
    }

    /// Ends the current session, releasing its surface.
    pub fn end_session(&mut self) {
        self.session = None;
    }

    /// Draws a proximity table, opening a new session if the reference changed.
    pub fn show_proximity(&mut self, table: &ProximityTable) {
        let mode = self.mode;
        let same_reference = self
            .session
            .as_ref()
            .is_some_and(|session| session.reference() == table.reference());
        if !same_reference {
            self.begin_session(table.reference());
        }
        if let Some(session) = self.session.as_mut() {
            session.render(table.records(), mode);
        }
    }

    /// Draws a daylight series.
    pub fn show_series(&mut self, days: &[DayRecord]) {
        self.chart.render_chart(days);
    }
}

impl core::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Presenter")
            .field("session", &self.session)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proximity::rank;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct RecordingSurface {
        id: usize,
        log: Log,
    }

    impl MapSink for RecordingSurface {
        fn render_map(&mut self, reference: &Place, records: &[ProximityRecord], mode: RenderMode) {
            self.log.lock().unwrap().push(format!(
                "render {} {} {} {mode:?}",
                self.id,
                reference.name(),
                records.len()
            ));
        }

        fn release(&mut self) {
            self.log.lock().unwrap().push(format!("release {}", self.id));
        }
    }

    struct RecordingChart {
        log: Log,
    }

    impl ChartSink for RecordingChart {
        fn render_chart(&mut self, days: &[DayRecord]) {
            self.log.lock().unwrap().push(format!("chart {}", days.len()));
        }
    }

    fn presenter(log: &Log) -> Presenter {
        let surfaces = Arc::clone(log);
        let mut next_id = 0;
        Presenter::new(
            move |reference: &Place| -> Box<dyn MapSink> {
                next_id += 1;
                surfaces
                    .lock()
                    .unwrap()
                    .push(format!("create {next_id} {}", reference.name()));
                Box::new(RecordingSurface {
                    id: next_id,
                    log: Arc::clone(&surfaces),
                })
            },
            RecordingChart {
                log: Arc::clone(log),
            },
        )
    }

    fn catalog(count: usize) -> Vec<Place> {
        (0..count)
            .map(|i| Place::new(format!("P{i}"), 0.0, i as f64 * 0.1, 1_000).unwrap())
            .collect()
    }

    #[test]
    fn test_old_surface_is_released_before_new_one_is_created() {
        let log = Log::default();
        let mut presenter = presenter(&log);
        let places = catalog(3);

        presenter.show_proximity(&rank(&places[0], &places, 0));
        presenter.show_proximity(&rank(&places[0], &places, 0));
        presenter.show_proximity(&rank(&places[1], &places, 0));
        presenter.end_session();

        assert_eq!(
            *log.lock().unwrap(),
            [
                "create 1 P0",
                "render 1 P0 3 Bubble",
                "render 1 P0 3 Bubble",
                "release 1",
                "create 2 P1",
                "render 2 P1 3 Bubble",
                "release 2",
            ]
        );
    }

    #[test]
    fn test_mode_limits_rendered_records() {
        let log = Log::default();
        let mut presenter = presenter(&log);
        let places = catalog(20);
        let table = rank(&places[0], &places, 0);

        presenter.set_mode(RenderMode::Line);
        presenter.show_proximity(&table);
        presenter.set_mode(RenderMode::Polygon);
        presenter.show_proximity(&table);
        presenter.set_mode(RenderMode::Bubble);
        presenter.show_proximity(&table);

        let log = log.lock().unwrap();
        assert_eq!(log[1], "render 1 P0 15 Line");
        assert_eq!(log[2], "render 1 P0 10 Polygon");
        assert_eq!(log[3], "render 1 P0 20 Bubble");
    }

    #[test]
    fn test_series_goes_to_chart() {
        let log = Log::default();
        let mut presenter = presenter(&log);
        presenter.show_series(&[]);
        assert_eq!(*log.lock().unwrap(), ["chart 0"]);
        assert!(presenter.session().is_none());
    }
}

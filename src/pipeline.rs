//! Trigger handling for the two pipelines.
//!
//! A [`Dashboard`] holds the catalog, the selected reference place and the population
//! threshold. Changing any of them reruns the affected pipeline: the proximity ranker
//! runs inline (it is cheap), the daylight series runs on a worker thread with a
//! deadline. Every daylight run is tagged with a [`Generation`]; starting a new run
//! cancels the previous one, and a run that finishes after being superseded is
//! discarded instead of published.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::daylight::{CancellationToken, DaylightSeriesBuilder};
use crate::oracle::{EventOracle, RetryingOracle};
use crate::proximity::{ProximityRanker, ProximityTable, ReferenceResolution};
use crate::render::Presenter;
use crate::{DayRecord, Error, Observer, Place, RenderMode, Result};
use chrono::{Datelike, Utc};
use log::{debug, info, warn};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Sequence number of a daylight run; higher is newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Raw sequence number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// What happened to a finished daylight run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The series was published.
    Published {
        /// Generation of the published run
        generation: Generation,
        /// Number of day records
        days: usize,
    },
    /// A newer run was started before this one finished; its result was dropped.
    Superseded {
        /// Generation of the discarded run
        generation: Generation,
    },
}

/// A daylight series being computed on a worker thread.
#[derive(Debug)]
pub struct DaylightRun {
    generation: Generation,
    reference: Place,
    token: CancellationToken,
    started: Instant,
    timeout: std::time::Duration,
    receiver: mpsc::Receiver<Result<Vec<DayRecord>>>,
}

impl DaylightRun {
    /// Generation this run was started with.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Reference place the series is computed for.
    #[must_use]
    pub const fn reference(&self) -> &Place {
        &self.reference
    }

    /// Asks the worker to stop at the next day boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Blocks until the worker reports or the deadline passes.
    fn wait(&self) -> Result<Vec<DayRecord>> {
        let remaining = self.timeout.saturating_sub(self.started.elapsed());
        match self.receiver.recv_timeout(remaining) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                self.token.cancel();
                let elapsed_ms =
                    u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
                Err(Error::Timeout { elapsed_ms })
            }
            Err(RecvTimeoutError::Disconnected) => Err(Error::oracle_unavailable(
                "daylight worker exited without a result",
            )),
        }
    }
}

/// Published daylight series.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedSeries {
    /// Run that produced the series
    pub generation: Generation,
    /// Name of the reference place
    pub reference: String,
    /// Year the series covers
    pub year: i32,
    /// One record per day
    pub days: Vec<DayRecord>,
}

/// Catalog, selection and threshold state driving both pipelines.
#[derive(Debug)]
pub struct Dashboard<O> {
    oracle: Arc<O>,
    config: Config,
    catalog: Arc<Catalog>,
    reference: Option<Place>,
    min_population: u64,
    year: i32,
    proximity: Option<ProximityTable>,
    series: Option<PublishedSeries>,
    latest: Generation,
    in_flight: Option<CancellationToken>,
    presenter: Option<Presenter>,
}

impl<O> Dashboard<O>
where
    O: EventOracle + Send + Sync + 'static,
{
    /// Dashboard over `catalog` with nothing selected, for the current year.
    ///
    /// # Errors
    /// Returns `Config` if the configuration does not validate.
    pub fn new(oracle: O, catalog: Catalog, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            oracle: Arc::new(oracle),
            min_population: config.default_min_population,
            config,
            catalog: Arc::new(catalog),
            reference: None,
            year: Utc::now().year(),
            proximity: None,
            series: None,
            latest: Generation(0),
            in_flight: None,
            presenter: None,
        })
    }

    /// Sets the year daylight series are computed for.
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    /// Attaches map and chart sinks.
    #[must_use]
    pub fn with_presenter(mut self, presenter: Presenter) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Current catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Effective reference place.
    #[must_use]
    pub const fn reference(&self) -> Option<&Place> {
        self.reference.as_ref()
    }

    /// Current population threshold.
    #[must_use]
    pub const fn min_population(&self) -> u64 {
        self.min_population
    }

    /// Latest proximity table.
    #[must_use]
    pub const fn proximity(&self) -> Option<&ProximityTable> {
        self.proximity.as_ref()
    }

    /// Last successfully published daylight series.
    #[must_use]
    pub const fn series(&self) -> Option<&PublishedSeries> {
        self.series.as_ref()
    }

    /// Newest generation handed out.
    #[must_use]
    pub const fn latest_generation(&self) -> Generation {
        self.latest
    }

    /// Attached presenter.
    #[must_use]
    pub fn presenter_mut(&mut self) -> Option<&mut Presenter> {
        self.presenter.as_mut()
    }

    /// Selects the reference place and reruns both pipelines.
    ///
    /// An unknown name falls back to the first catalog entry.
    ///
    /// # Errors
    /// Returns `MissingReference` if the catalog is empty, or the daylight run's error.
    /// On error the previously published series is kept.
    pub fn select_reference(&mut self, name: &str) -> Result<RunOutcome> {
        let requested = match self.catalog.find(name) {
            Some(place) => place.clone(),
            None => self
                .catalog
                .first()
                .cloned()
                .ok_or_else(|| Error::missing_reference(name))?,
        };
        if requested.name() != name {
            warn!(
                "reference `{name}` not in catalog, falling back to `{}`",
                requested.name()
            );
        }
        self.reference = Some(requested);
        self.rerank();
        self.refresh_daylight()
    }

    /// Replaces the catalog and reruns the ranker; if the selected reference is no
    /// longer listed, the first entry takes its place and the daylight series reruns too.
    ///
    /// # Errors
    /// Returns the daylight run's error when one was needed.
    pub fn replace_catalog(&mut self, catalog: Catalog) -> Result<Option<RunOutcome>> {
        info!(
            "catalog replaced: `{}` with {} places",
            catalog.region(),
            catalog.len()
        );
        self.catalog = Arc::new(catalog);

        let Some(previous) = self.reference.clone() else {
            return Ok(None);
        };
        self.rerank();

        let reference_moved = self
            .proximity
            .as_ref()
            .is_some_and(|table| table.resolution() != &ReferenceResolution::Resolved);
        if !reference_moved {
            return Ok(None);
        }

        match self.proximity.as_ref().map(ProximityTable::reference) {
            Some(fallback) if !self.catalog.is_empty() => {
                warn!(
                    "reference `{}` left the catalog, using `{}`",
                    previous.name(),
                    fallback.name()
                );
                self.reference = Some(fallback.clone());
                self.refresh_daylight().map(Some)
            }
            _ => {
                warn!("catalog is empty; clearing reference `{}`", previous.name());
                self.cancel_in_flight();
                self.reference = None;
                self.proximity = None;
                Ok(None)
            }
        }
    }

    /// Changes the population threshold and reruns the ranker.
    pub fn set_min_population(&mut self, min_population: u64) {
        self.min_population = min_population;
        self.rerank();
    }

    /// Changes the map mode and redraws the current table.
    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.set_mode(mode);
            if let Some(table) = self.proximity.as_ref() {
                presenter.show_proximity(table);
            }
        }
    }

    /// Starts a daylight run for the current reference on a worker thread,
    /// cancelling any run still in flight.
    ///
    /// # Errors
    /// Returns `MissingReference` if no reference is selected.
    pub fn begin_daylight_run(&mut self) -> Result<DaylightRun> {
        let reference = self
            .reference
            .clone()
            .ok_or_else(|| Error::missing_reference("<none selected>"))?;

        self.cancel_in_flight();
        self.latest = Generation(self.latest.0 + 1);
        let generation = self.latest;
        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());

        let (sender, receiver) = mpsc::channel();
        let builder = DaylightSeriesBuilder::from_config(
            RetryingOracle::new(Arc::clone(&self.oracle), self.config.retry),
            &self.config,
        );
        let observer = Observer::from_place(&reference);
        let year = self.year;
        let worker_token = token.clone();
        debug!(
            "daylight run {} started for `{}`",
            generation.get(),
            reference.name()
        );
        thread::spawn(move || {
            let result = builder.build_year_cancellable(&observer, year, &worker_token);
            // The receiver is gone if the run was abandoned; nothing to report then.
            let _ = sender.send(result);
        });

        Ok(DaylightRun {
            generation,
            reference,
            token,
            started: Instant::now(),
            timeout: self.config.run_timeout(),
            receiver,
        })
    }

    /// Waits for `run` and publishes its series if no newer run has started.
    ///
    /// # Errors
    /// Returns the run's error (`Timeout`, `Cancelled`, `OracleUnavailable`, ...) if it
    /// is still the newest run. The previous series stays published.
    pub fn complete_daylight_run(&mut self, run: DaylightRun) -> Result<RunOutcome> {
        let result = run.wait();
        let generation = run.generation();

        if generation != self.latest {
            warn!(
                "daylight run {} superseded by {}; result discarded",
                generation.get(),
                self.latest.get()
            );
            return Ok(RunOutcome::Superseded { generation });
        }
        self.in_flight = None;

        let days = result.inspect_err(|err| {
            warn!("daylight run {} failed: {err}", generation.get());
        })?;
        debug!(
            "daylight run {} published {} days for `{}`",
            generation.get(),
            days.len(),
            run.reference().name()
        );
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.show_series(&days);
        }
        let count = days.len();
        self.series = Some(PublishedSeries {
            generation,
            reference: run.reference().name().to_owned(),
            year: self.year,
            days,
        });
        Ok(RunOutcome::Published {
            generation,
            days: count,
        })
    }

    fn refresh_daylight(&mut self) -> Result<RunOutcome> {
        let run = self.begin_daylight_run()?;
        self.complete_daylight_run(run)
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    fn rerank(&mut self) {
        let Some(reference) = self.reference.as_ref() else {
            return;
        };
        let table = ProximityRanker::new()
            .excluding_reference(self.config.exclude_reference)
            .rank(reference, self.catalog.places(), self.min_population);
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.show_proximity(&table);
        }
        self.proximity = Some(table);
    }
}

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use harvester_core::{
    update, Effect, Field, HarvestState, HarvestView, ItemRecord, Msg, Phase, Position,
    RetryPolicy, SidebarAd,
};

use crate::locator::locators;
use crate::{current_ads, materialize, DocumentSession, FieldRegistry, HarvestError, Locator, SessionError};

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub retry: RetryPolicy,
    /// Container whose `div` children are the feed items.
    pub feed_locator: Locator,
    pub ad_locator: Locator,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            feed_locator: locators::FEED,
            ad_locator: locators::SIDEBAR_AD,
        }
    }
}

/// Blocks the control thread between retries.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Owns a document session and harvests its feed.
pub struct FeedHarvester<S: DocumentSession> {
    session: S,
    settings: HarvestSettings,
    registry: FieldRegistry,
    sleeper: Box<dyn Sleeper>,
}

impl<S: DocumentSession> FeedHarvester<S> {
    pub fn new(session: S, settings: HarvestSettings) -> Self {
        Self {
            session,
            settings,
            registry: FieldRegistry::standard(),
            sleeper: Box::new(ThreadSleeper),
        }
    }

    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn settings(&self) -> &HarvestSettings {
        &self.settings
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Starts a harvest from the top of the feed.
    ///
    /// The returned iterator is lazy: the session is untouched until the first
    /// `next()`. Each call starts over at position 1. An empty `fields` slice
    /// collects every field.
    pub fn browse(&mut self, fields: &[Field]) -> FeedHarvest<'_, S> {
        FeedHarvest {
            session: &mut self.session,
            settings: &self.settings,
            registry: &self.registry,
            sleeper: self.sleeper.as_ref(),
            fields: fields.to_vec(),
            state: HarvestState::new(self.settings.retry),
            pending: VecDeque::new(),
            found: None,
            started: false,
            done: false,
        }
    }

    pub fn current_ads(&mut self) -> Result<Vec<SidebarAd>, SessionError> {
        current_ads(&mut self.session, &self.settings.ad_locator)
    }
}

enum Step {
    Continue,
    Yield(ItemRecord),
    Finished,
}

/// A running harvest. Yields records in position order until the feed looks
/// exhausted; a fatal error is yielded once and ends the sequence.
pub struct FeedHarvest<'a, S: DocumentSession> {
    session: &'a mut S,
    settings: &'a HarvestSettings,
    registry: &'a FieldRegistry,
    sleeper: &'a dyn Sleeper,
    fields: Vec<Field>,
    state: HarvestState,
    pending: VecDeque<Effect>,
    found: Option<(Position, S::Node)>,
    started: bool,
    done: bool,
}

impl<S: DocumentSession> FeedHarvest<'_, S> {
    pub fn progress(&self) -> HarvestView {
        self.state.view()
    }

    fn dispatch(&mut self, msg: Msg) {
        let (next, effects) = update(std::mem::take(&mut self.state), msg);
        self.state = next;
        self.pending.extend(effects);
    }

    fn session_error(&self, source: SessionError) -> HarvestError {
        let position = self.state.position();
        engine_error!("Session failure at position {position}: {source}");
        HarvestError::Session { position, source }
    }

    fn run_effect(&mut self, effect: Effect) -> Result<Step, HarvestError> {
        match effect {
            Effect::ScrollToTop => {
                self.session
                    .scroll_to(0)
                    .map_err(|err| self.session_error(err))?;
            }
            Effect::LocateFeed => {
                let locator = &self.settings.feed_locator;
                let present = self
                    .session
                    .has_element(locator)
                    .map_err(|err| self.session_error(err))?;
                if !present {
                    engine_error!("Could not find feed element with '{locator}'");
                    return Err(HarvestError::FeedStructureMissing {
                        locator: locator.as_str().to_string(),
                        position: self.state.position(),
                    });
                }
                self.dispatch(Msg::FeedLocated);
            }
            Effect::Probe { position } => {
                let item = self
                    .session
                    .find_item(&self.settings.feed_locator, position)
                    .map_err(|err| self.session_error(err))?;
                match item {
                    Some(node) => {
                        self.found = Some((position, node));
                        self.dispatch(Msg::ProbeFound);
                    }
                    None => {
                        // Logged before dispatch: the last failure of a cycle resets the counter.
                        if self.state.phase() == Phase::LoadBackoff {
                            engine_warn!(
                                "{} Load fail count: {} (position {position})",
                                self.state.view().emitted,
                                self.state.load_failures() + 1
                            );
                        }
                        self.dispatch(Msg::ProbeMissing);
                    }
                }
            }
            Effect::Emit { position } => {
                let mut node = match self.found.take() {
                    Some((found_at, node)) if found_at == position => node,
                    _ => self
                        .session
                        .find_item(&self.settings.feed_locator, position)
                        .map_err(|err| self.session_error(err))?
                        .ok_or_else(|| {
                            self.session_error(SessionError::Browser(format!(
                                "item {position} vanished before it could be read"
                            )))
                        })?,
                };
                let record = materialize(&mut node, position, &self.fields, self.registry)
                    .map_err(|err| self.session_error(err))?;
                engine_debug!("Emitting item {position} with {} fields", record.len());
                self.dispatch(Msg::Emitted);
                return Ok(Step::Yield(record));
            }
            Effect::ScrollToBottom { settle } => {
                engine_warn!(
                    "{} Scroll fail count: {} (position {})",
                    self.state.view().emitted,
                    self.state.scroll_failures(),
                    self.state.position()
                );
                self.session
                    .scroll_to_bottom()
                    .map_err(|err| self.session_error(err))?;
                self.sleeper.sleep(settle);
                self.dispatch(Msg::ScrollSettled);
            }
            Effect::Sleep(duration) => self.sleeper.sleep(duration),
            Effect::Finish => {
                let view = self.state.view();
                engine_info!(
                    "Feed exhausted after {} items and {} scroll cycles",
                    view.emitted,
                    view.scroll_cycles
                );
                return Ok(Step::Finished);
            }
        }
        Ok(Step::Continue)
    }
}

impl<S: DocumentSession> Iterator for FeedHarvest<'_, S> {
    type Item = Result<ItemRecord, HarvestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            engine_info!("Starting harvest at '{}'", self.settings.feed_locator);
            self.dispatch(Msg::Start);
        }
        while let Some(effect) = self.pending.pop_front() {
            match self.run_effect(effect) {
                Ok(Step::Continue) => {}
                Ok(Step::Yield(record)) => return Some(Ok(record)),
                Ok(Step::Finished) => break,
                Err(err) => {
                    self.done = true;
                    self.pending.clear();
                    return Some(Err(err));
                }
            }
        }
        self.done = true;
        None
    }
}

impl<S: DocumentSession> std::iter::FusedIterator for FeedHarvest<'_, S> {}

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

use harvester_core::{Field, FieldValue, Position, RetryPolicy};
use harvester_engine::{
    AdElement, DocumentSession, FeedHarvester, HarvestError, HarvestSettings, Locator,
    SessionError, Sleeper, SnapshotNode,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

type Script = Box<dyn FnMut(Position, usize) -> bool>;

/// Session whose items exist whenever the script says so.
struct ScriptedSession {
    script: Script,
    feed_present: bool,
    broken_at: Option<Position>,
    attempts: HashMap<Position, usize>,
    probes: Vec<Position>,
    scroll_tops: usize,
    scroll_bottoms: usize,
}

impl ScriptedSession {
    fn new(script: impl FnMut(Position, usize) -> bool + 'static) -> Self {
        Self {
            script: Box::new(script),
            feed_present: true,
            broken_at: None,
            attempts: HashMap::new(),
            probes: Vec::new(),
            scroll_tops: 0,
            scroll_bottoms: 0,
        }
    }
}

fn post_html(position: Position) -> String {
    format!(
        r#"<div><h3><a href="/user{position}"><strong>User {position}</strong></a></h3>
        <div data-ad-preview="message">Post number {position}</div></div>"#
    )
}

impl DocumentSession for ScriptedSession {
    type Node = SnapshotNode;

    fn go_to_feed(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    fn scroll_to(&mut self, offset: u64) -> Result<(), SessionError> {
        assert_eq!(offset, 0);
        self.scroll_tops += 1;
        Ok(())
    }

    fn scroll_to_bottom(&mut self) -> Result<(), SessionError> {
        self.scroll_bottoms += 1;
        Ok(())
    }

    fn scroll_offset(&mut self) -> Result<u64, SessionError> {
        Ok(self.scroll_bottoms as u64)
    }

    fn has_element(&mut self, _locator: &Locator) -> Result<bool, SessionError> {
        Ok(self.feed_present)
    }

    fn find_item(
        &mut self,
        _feed: &Locator,
        position: Position,
    ) -> Result<Option<SnapshotNode>, SessionError> {
        if self.broken_at == Some(position) {
            return Err(SessionError::Browser("tab crashed".into()));
        }
        self.probes.push(position);
        let attempt = self.attempts.entry(position).or_insert(0);
        *attempt += 1;
        let attempt = *attempt;
        Ok((self.script)(position, attempt).then(|| SnapshotNode::new(post_html(position))))
    }

    fn advertisement_elements(
        &mut self,
        _locator: &Locator,
    ) -> Result<Vec<AdElement>, SessionError> {
        Ok(Vec::new())
    }
}

#[derive(Clone, Default)]
struct RecordingSleeper(Rc<RefCell<Vec<Duration>>>);

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.0.borrow_mut().push(duration);
    }
}

fn harvester(session: ScriptedSession) -> (FeedHarvester<ScriptedSession>, RecordingSleeper) {
    let sleeper = RecordingSleeper::default();
    let harvester = FeedHarvester::new(session, HarvestSettings::default())
        .with_sleeper(sleeper.clone());
    (harvester, sleeper)
}

#[test]
fn found_items_are_emitted_in_order_without_gaps() {
    init_logging();
    let (mut harvester, _) = harvester(ScriptedSession::new(|position, _| position <= 5));
    let positions: Vec<Position> = harvester
        .browse(&[])
        .map(|record| record.expect("record").position())
        .collect();
    assert_eq!(positions, vec![1, 2, 3, 4, 5]);
}

#[test]
fn never_found_terminates_after_ten_scroll_cycles() {
    init_logging();
    let (mut harvester, sleeper) = harvester(ScriptedSession::new(|_, _| false));
    let records: Vec<_> = harvester.browse(&[Field::Text]).collect();
    assert!(records.is_empty());

    let policy = RetryPolicy::default();
    assert_eq!(harvester.session().scroll_bottoms, 10);
    let sleeps = sleeper.0.borrow();
    assert_eq!(sleeps.iter().filter(|d| **d == policy.settle).count(), 10);
    assert_eq!(
        sleeps
            .iter()
            .filter(|d| **d == policy.load_retry_interval)
            .count(),
        100
    );
}

#[test]
fn three_items_then_empty_window_yields_three_records() {
    init_logging();
    let (mut harvester, _) = harvester(ScriptedSession::new(|position, _| position <= 3));
    let records: Vec<_> = harvester
        .browse(&[Field::Author, Field::Text])
        .collect::<Result<_, _>>()
        .expect("no fatal error");
    assert_eq!(records.len(), 3);
    assert_eq!(
        records[2].get(Field::Author),
        Some(&FieldValue::Text("User 3".into()))
    );
    assert_eq!(
        records[2].get(Field::Text),
        Some(&FieldValue::Text("Post number 3".into()))
    );
    assert!(!records[2].contains(Field::Reactions));
    assert_eq!(harvester.session().scroll_bottoms, 10);
}

#[test]
fn load_retry_exhaustion_starts_another_scroll_cycle() {
    init_logging();
    // Position 1 never renders; position 2 is there on the first look.
    let (mut harvester, _) = harvester(ScriptedSession::new(|position, _| position == 2));
    let mut harvest = harvester.browse(&[Field::Text]);
    let first = harvest.next().expect("an item").expect("no error");
    assert_eq!(first.position(), 2);
    drop(harvest);

    let session = harvester.session();
    assert_eq!(session.scroll_bottoms, 1);
    assert_eq!(session.attempts[&1], 11);
}

#[test]
fn late_item_resets_counters_and_position_advances_by_one() {
    init_logging();
    // Position 2 shows up on its 10th look: one plain probe plus nine load retries.
    let (mut harvester, _) = harvester(ScriptedSession::new(|position, attempt| {
        position == 1 || (position == 2 && attempt >= 10) || position == 3
    }));
    let mut harvest = harvester.browse(&[Field::Text]);
    let positions: Vec<Position> = harvest
        .by_ref()
        .take(3)
        .map(|record| record.unwrap().position())
        .collect();
    assert_eq!(positions, vec![1, 2, 3]);
    let view = harvest.progress();
    assert_eq!(view.position, 4);
    assert_eq!(view.scroll_failures, 0);
    assert_eq!(view.load_failures, 0);
}

#[test]
fn browsing_twice_replays_from_the_top() {
    init_logging();
    let (mut harvester, _) = harvester(ScriptedSession::new(|position, _| position <= 2));
    let first: Vec<Position> = harvester
        .browse(&[])
        .map(|r| r.unwrap().position())
        .collect();
    let second: Vec<Position> = harvester
        .browse(&[])
        .map(|r| r.unwrap().position())
        .collect();
    assert_eq!(first, vec![1, 2]);
    assert_eq!(second, vec![1, 2]);
    assert_eq!(harvester.session().scroll_tops, 2);
}

#[test]
fn browse_is_lazy_until_first_item_is_requested() {
    init_logging();
    let (mut harvester, _) = harvester(ScriptedSession::new(|_, _| true));
    let harvest = harvester.browse(&[]);
    drop(harvest);
    assert_eq!(harvester.session().scroll_tops, 0);
    assert!(harvester.session().probes.is_empty());
}

#[test]
fn missing_feed_aborts_with_feed_structure_error() {
    init_logging();
    let mut session = ScriptedSession::new(|_, _| true);
    session.feed_present = false;
    let (mut harvester, _) = harvester(session);
    let mut harvest = harvester.browse(&[]);
    let err = harvest.next().expect("one item").unwrap_err();
    assert_eq!(
        err,
        HarvestError::FeedStructureMissing {
            locator: r#"div[role="feed"]"#.to_string(),
            position: 1,
        }
    );
    assert!(err.to_string().contains("position 1"));
    assert_eq!(harvest.next(), None);
    drop(harvest);
    assert!(harvester.session().probes.is_empty());
}

#[test]
fn session_failure_propagates_with_position() {
    init_logging();
    let mut session = ScriptedSession::new(|_, _| true);
    session.broken_at = Some(3);
    let (mut harvester, _) = harvester(session);
    let results: Vec<_> = harvester.browse(&[Field::Text]).collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert_eq!(
        results[2],
        Err(HarvestError::Session {
            position: 3,
            source: SessionError::Browser("tab crashed".into()),
        })
    );
}

#[test]
fn stopping_early_is_safe() {
    init_logging();
    let (mut harvester, _) = harvester(ScriptedSession::new(|_, _| true));
    let taken: Vec<_> = harvester.browse(&[Field::Text]).take(2).collect();
    assert_eq!(taken.len(), 2);
    assert_eq!(harvester.session().probes, vec![1, 2]);
}

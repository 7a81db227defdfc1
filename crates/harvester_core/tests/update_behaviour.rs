use std::sync::Once;
use std::time::Duration;

use harvester_core::{update, Effect, HarvestState, Msg, Phase, Position, RetryPolicy};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[derive(Debug, Default)]
struct Trace {
    emitted: Vec<Position>,
    probes: Vec<Position>,
    scrolls: usize,
    sleeps: Vec<Duration>,
}

/// Drives the machine to completion, answering each probe with `found(position, attempt)`.
fn run(policy: RetryPolicy, mut found: impl FnMut(Position, usize) -> bool) -> (HarvestState, Trace) {
    let mut trace = Trace::default();
    let (mut state, mut pending) = update(HarvestState::new(policy), Msg::Start);
    let mut steps = 0;
    while !pending.is_empty() {
        steps += 1;
        assert!(steps < 100_000, "machine did not terminate");
        let effect = pending.remove(0);
        let reply = match effect {
            Effect::ScrollToTop | Effect::Sleep(_) | Effect::Finish => {
                if let Effect::Sleep(d) = effect {
                    trace.sleeps.push(d);
                }
                None
            }
            Effect::LocateFeed => Some(Msg::FeedLocated),
            Effect::Probe { position } => {
                trace.probes.push(position);
                let attempt = trace.probes.iter().filter(|p| **p == position).count();
                Some(if found(position, attempt) {
                    Msg::ProbeFound
                } else {
                    Msg::ProbeMissing
                })
            }
            Effect::Emit { position } => {
                trace.emitted.push(position);
                Some(Msg::Emitted)
            }
            Effect::ScrollToBottom { settle } => {
                trace.scrolls += 1;
                trace.sleeps.push(settle);
                Some(Msg::ScrollSettled)
            }
        };
        if let Some(msg) = reply {
            let (next, effects) = update(state, msg);
            state = next;
            pending.extend(effects);
        }
    }
    (state, trace)
}

#[test]
fn start_scrolls_to_top_then_locates_feed() {
    init_logging();
    let (state, effects) = update(HarvestState::default(), Msg::Start);
    assert_eq!(effects, vec![Effect::ScrollToTop, Effect::LocateFeed]);
    assert_eq!(state.position(), 1);

    let (state, effects) = update(state, Msg::FeedLocated);
    assert_eq!(state.phase(), Phase::Probing);
    assert_eq!(effects, vec![Effect::Probe { position: 1 }]);
}

#[test]
fn never_found_ends_after_ten_scroll_cycles_with_no_items() {
    init_logging();
    let (state, trace) = run(RetryPolicy::default(), |_, _| false);
    assert!(state.is_exhausted());
    assert!(trace.emitted.is_empty());
    assert_eq!(trace.scrolls, 10);
    assert_eq!(state.view().scroll_cycles, 10);
}

#[test]
fn contiguous_items_are_emitted_in_order_without_gaps() {
    init_logging();
    let (state, trace) = run(RetryPolicy::default(), |position, _| position <= 3);
    assert_eq!(trace.emitted, vec![1, 2, 3]);
    assert_eq!(trace.scrolls, 10);
    assert_eq!(state.view().emitted, 3);
}

#[test]
fn load_exhaustion_moves_to_next_scroll_cycle_instead_of_aborting() {
    init_logging();
    // Position 1 never shows up; position 2 appears on its first probe.
    let (_, trace) = run(RetryPolicy::default(), |position, _| position == 2);
    assert_eq!(trace.emitted, vec![2]);
    // 1 initial probe, 1 after the scroll, 9 further load retries, then position 2.
    assert_eq!(trace.probes.iter().filter(|p| **p == 1).count(), 11);
    assert_eq!(trace.probes[11], 2);
}

#[test]
fn late_success_resets_both_counters_and_advances_by_one() {
    init_logging();
    let policy = RetryPolicy::default();
    let (state, _) = update(HarvestState::new(policy), Msg::Start);
    let (state, _) = update(state, Msg::FeedLocated);
    let (state, effects) = update(state, Msg::ProbeMissing);
    assert_eq!(
        effects,
        vec![Effect::ScrollToBottom {
            settle: policy.settle
        }]
    );
    assert_eq!(state.phase(), Phase::ScrollBackoff);
    assert_eq!(state.scroll_failures(), 1);

    let (mut state, _) = update(state, Msg::ScrollSettled);
    for _ in 0..(policy.max_load_failures - 1) {
        let (next, effects) = update(state, Msg::ProbeMissing);
        assert_eq!(
            effects,
            vec![
                Effect::Sleep(policy.load_retry_interval),
                Effect::Probe { position: 1 }
            ]
        );
        state = next;
    }
    assert_eq!(state.load_failures(), policy.max_load_failures - 1);

    let (state, effects) = update(state, Msg::ProbeFound);
    assert_eq!(effects, vec![Effect::Emit { position: 1 }]);
    let (state, effects) = update(state, Msg::Emitted);
    assert_eq!(effects, vec![Effect::Probe { position: 2 }]);
    assert_eq!(state.position(), 2);
    assert_eq!(state.scroll_failures(), 0);
    assert_eq!(state.load_failures(), 0);
}

#[test]
fn restart_replays_from_position_one() {
    init_logging();
    let (state, trace) = run(RetryPolicy::default().without_waits(), |position, _| position <= 2);
    assert_eq!(trace.emitted, vec![1, 2]);
    assert!(trace.sleeps.iter().all(|d| d.is_zero()));

    let (state, effects) = update(state, Msg::Start);
    assert_eq!(effects, vec![Effect::ScrollToTop, Effect::LocateFeed]);
    assert_eq!(state.position(), 1);
    assert_eq!(state.view().emitted, 0);
    assert_eq!(state.phase(), Phase::Positioning);
}

#[test]
fn items_appearing_after_a_scroll_are_picked_up() {
    init_logging();
    // Position 4 needs three probes (lazy render lag) before it appears.
    let (_, trace) = run(RetryPolicy::default(), |position, attempt| {
        position <= 3 || (position == 4 && attempt >= 3)
    });
    assert_eq!(trace.emitted, vec![1, 2, 3, 4]);
}

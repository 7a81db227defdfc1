use crate::{Effect, HarvestState, Msg, Phase};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages that do not apply to the current phase are ignored.
pub fn update(mut state: HarvestState, msg: Msg) -> (HarvestState, Vec<Effect>) {
    let effects = match (state.phase, msg) {
        (_, Msg::Start) => {
            state.restart();
            vec![Effect::ScrollToTop, Effect::LocateFeed]
        }
        (Phase::Positioning, Msg::FeedLocated) => advance(&mut state),
        (Phase::Probing | Phase::LoadBackoff, Msg::ProbeFound) => {
            state.phase = Phase::Emitting;
            vec![Effect::Emit {
                position: state.position,
            }]
        }
        (Phase::Emitting, Msg::Emitted) => {
            state.record_emission();
            advance(&mut state)
        }
        (Phase::Probing, Msg::ProbeMissing) => {
            state.begin_scroll_cycle();
            vec![Effect::ScrollToBottom {
                settle: state.policy.settle,
            }]
        }
        (Phase::ScrollBackoff, Msg::ScrollSettled) => {
            state.phase = Phase::LoadBackoff;
            vec![Effect::Probe {
                position: state.position,
            }]
        }
        (Phase::LoadBackoff, Msg::ProbeMissing) => {
            state.load_failures += 1;
            let mut effects = vec![Effect::Sleep(state.policy.load_retry_interval)];
            if state.load_failures < state.policy.max_load_failures {
                effects.push(Effect::Probe {
                    position: state.position,
                });
            } else {
                // Only the outer scroll counter ends the harvest; this cycle just gives up.
                state.abandon_position();
                effects.extend(advance(&mut state));
            }
            effects
        }
        _ => Vec::new(),
    };

    (state, effects)
}

fn advance(state: &mut HarvestState) -> Vec<Effect> {
    if state.scroll_failures >= state.policy.max_scroll_failures {
        state.phase = Phase::Exhausted;
        vec![Effect::Finish]
    } else {
        state.phase = Phase::Probing;
        vec![Effect::Probe {
            position: state.position,
        }]
    }
}

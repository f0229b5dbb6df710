mod support;

use homomorphism::{
    CancelToken, Edge, NullSink, OrchestratorError, Phase, RenderSink, SamplerError, Session,
    SessionAccess, SessionError, StepError, UpdateMode, UpdateOrchestrator, UpdateOutcome,
    VertexId,
};
use proptest::prelude::*;
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use support::{accepted, constant, rejected, ScriptedSampler};

fn ready(sampler: &ScriptedSampler, n: i64) -> Session {
    let mut session = Session::new();
    session.load_target_graph(sampler).unwrap();
    session.generate_biclique(sampler, n).unwrap();
    session
}

fn orchestrator(sampler: &ScriptedSampler, mode: UpdateMode) -> UpdateOrchestrator<&ScriptedSampler> {
    UpdateOrchestrator::new(sampler, mode).with_pause(Duration::ZERO)
}

#[test]
fn test_k33_single_step() {
    let sampler = ScriptedSampler::with_cycle(4);
    let mut session = ready(&sampler, 3);

    let s = session.graphs().biclique().unwrap();
    assert_eq!(s.graph().vertex_count(), 6);
    assert_eq!(s.graph().edge_count(), 9);
    let initial = session.chain().current().unwrap();
    assert_eq!(initial.domain().count(), 6);

    let mut next = constant(6, "0");
    next.insert(VertexId::biclique(0), VertexId::target("1"));
    sampler.push_update(Ok(accepted(next.clone(), 0, "1", &[("1", "0")])));

    let outcome = orchestrator(&sampler, UpdateMode::Regular).step_once(&mut session);
    assert_eq!(outcome, UpdateOutcome::Accepted { history_len: 2 });
    assert_eq!(session.chain().current(), Some(&next));

    let selection = session.selection();
    assert_eq!(selection.selected_s.as_ref().map(ToString::to_string).as_deref(), Some("S-0"));
    assert_eq!(selection.selected_g.as_ref().map(ToString::to_string).as_deref(), Some("G-1"));
    assert!(session.node_role(&VertexId::biclique(0)).is_active());
    assert!(!session.node_role(&VertexId::target("0")).is_active());
}

#[test]
fn test_alternating_batch_of_100() {
    let sampler = ScriptedSampler::with_cycle(5);
    let mut session = ready(&sampler, 2);
    for i in 0..100 {
        if i % 2 == 0 {
            sampler.push_update(Ok(accepted(constant(4, "1"), 0, "1", &[])));
        } else {
            sampler.push_update(Ok(rejected(constant(4, "1"), 1, Some("No valid neighbors"))));
        }
    }

    let tally = orchestrator(&sampler, UpdateMode::Neighbourhood)
        .step_many(&mut session, 100, &CancelToken::new(), &NullSink)
        .unwrap();

    assert_eq!(tally.succeeded + tally.failed, 100);
    assert_eq!(tally.succeeded, 50);
    assert!(!tally.cancelled);
    assert_eq!(session.chain().len(), 1 + 50);
    assert_eq!(tally.to_string(), "Out of 100 iterations: 50 succeeded, 50 failed");
    assert!(sampler
        .update_calls
        .lock()
        .unwrap()
        .iter()
        .all(|m| *m == UpdateMode::Neighbourhood));
}

#[test]
fn test_transport_error_does_not_abort_batch() {
    let sampler = ScriptedSampler::with_cycle(3);
    let mut session = ready(&sampler, 1);
    sampler.push_update(Ok(accepted(constant(2, "2"), 0, "2", &[])));
    sampler.push_update(Err(SamplerError::Transport {
        url: "http://localhost:5000/update_homomorphism".into(),
        reason: "connection reset".into(),
    }));
    sampler.push_update(Ok(accepted(constant(2, "1"), 1, "1", &[])));

    let tally = orchestrator(&sampler, UpdateMode::Regular)
        .step_many(&mut session, 3, &CancelToken::new(), &NullSink)
        .unwrap();
    assert_eq!((tally.succeeded, tally.failed), (2, 1));
    assert_eq!(sampler.calls(), 3);
    assert_eq!(session.chain().len(), 3);
}

#[test]
fn test_failed_fetch_blocks_mapping_operations() {
    let sampler = ScriptedSampler::new(Err(SamplerError::Transport {
        url: "http://localhost:5000/get_graph".into(),
        reason: "connection refused".into(),
    }));
    let mut session = Session::new();

    assert!(matches!(
        session.load_target_graph(&sampler),
        Err(SessionError::Fetch(_))
    ));
    assert!(session.graphs().target().is_empty());
    assert_eq!(
        session.generate_biclique(&sampler, 3).unwrap_err(),
        SessionError::TargetGraphMissing
    );
    assert_eq!(*sampler.generate_calls.lock().unwrap(), 0);

    let orch = orchestrator(&sampler, UpdateMode::Regular);
    assert_eq!(
        orch.step_many(&mut session, 5, &CancelToken::new(), &NullSink),
        Err(OrchestratorError::TargetGraphMissing)
    );
    assert_eq!(
        orch.step_once(&mut session),
        UpdateOutcome::Failed(StepError::TargetGraphMissing)
    );
    assert_eq!(sampler.calls(), 0);
}

fn connection_refused(endpoint: &str) -> SamplerError {
    SamplerError::Transport {
        url: format!("http://localhost:5000{endpoint}"),
        reason: "connection refused".into(),
    }
}

#[test]
fn test_failed_reload_stops_updates() {
    let sampler = ScriptedSampler::with_cycle(4);
    let mut session = ready(&sampler, 1);
    sampler.push_update(Ok(accepted(constant(2, "1"), 0, "1", &[("0", "1")])));
    let orch = orchestrator(&sampler, UpdateMode::Regular);
    assert!(orch.step_once(&mut session).is_success());

    sampler.set_target(Err(connection_refused("/get_graph")));
    assert!(matches!(
        session.load_target_graph(&sampler),
        Err(SessionError::Fetch(_))
    ));
    assert!(session.graphs().target().is_empty());
    assert!(session.graphs().biclique().is_none());
    assert!(session.chain().is_empty());
    assert!(session.selection().is_empty());

    sampler.push_update(Ok(accepted(constant(2, "2"), 1, "2", &[])));
    assert_eq!(
        orch.step_once(&mut session),
        UpdateOutcome::Failed(StepError::TargetGraphMissing)
    );
    assert_eq!(
        orch.step_many(&mut session, 3, &CancelToken::new(), &NullSink),
        Err(OrchestratorError::TargetGraphMissing)
    );
    assert_eq!(sampler.calls(), 1);
}

#[test]
fn test_reload_after_failure_requires_new_biclique() {
    let sampler = ScriptedSampler::with_cycle(4);
    let mut session = ready(&sampler, 2);
    sampler.set_target(Err(connection_refused("/get_graph")));
    let _ = session.load_target_graph(&sampler);

    sampler.set_target(Ok(support::cycle(4)));
    session.load_target_graph(&sampler).unwrap();
    assert_eq!(
        orchestrator(&sampler, UpdateMode::Regular).step_once(&mut session),
        UpdateOutcome::Failed(StepError::NoBiclique)
    );
    session.generate_biclique(&sampler, 2).unwrap();
    assert_eq!(session.chain().len(), 1);
}

#[derive(Default)]
struct PhaseLog(RefCell<Vec<Phase>>);

impl RenderSink for PhaseLog {
    fn request_redraw(&self) {}

    fn phase_changed(&self, phase: Phase) {
        self.0.borrow_mut().push(phase);
    }
}

#[test]
fn test_step_reports_phases() {
    let sampler = ScriptedSampler::with_cycle(3);
    let mut session = ready(&sampler, 1);
    let orch = orchestrator(&sampler, UpdateMode::Regular);

    sampler.push_update(Ok(accepted(constant(2, "1"), 0, "1", &[])));
    let log = PhaseLog::default();
    orch.step_once_with(&mut session, &log);
    assert_eq!(
        *log.0.borrow(),
        vec![Phase::Requesting, Phase::Applying, Phase::Reporting, Phase::Idle]
    );

    sampler.push_update(Err(connection_refused("/update_homomorphism")));
    let log = PhaseLog::default();
    orch.step_once_with(&mut session, &log);
    assert_eq!(
        *log.0.borrow(),
        vec![Phase::Requesting, Phase::Reporting, Phase::Idle]
    );

    let mut empty = Session::new();
    let log = PhaseLog::default();
    orch.step_once_with(&mut empty, &log);
    assert!(log.0.borrow().is_empty());
}

#[test]
fn test_zero_iterations_rejected() {
    let sampler = ScriptedSampler::with_cycle(3);
    let mut session = ready(&sampler, 1);
    assert_eq!(
        orchestrator(&sampler, UpdateMode::Regular).step_many(
            &mut session,
            0,
            &CancelToken::new(),
            &NullSink
        ),
        Err(OrchestratorError::InvalidIterationCount)
    );
}

#[test]
fn test_generation_refusal_is_surfaced() {
    let sampler = ScriptedSampler::with_cycle(3);
    let mut session = ready(&sampler, 2);
    sampler.push_generated(Err(SamplerError::Refused {
        endpoint: "/generate_biclique",
        status: 400,
        message: "Graph G is empty".into(),
    }));

    let err = session.generate_biclique(&sampler, 3).unwrap_err();
    assert_eq!(err.to_string(), "Graph G is empty");
    assert_eq!(session.biclique_size(), 2);
    assert_eq!(session.chain().len(), 1);
}

#[test]
fn test_stale_mapping_after_regeneration() {
    let sampler = ScriptedSampler::with_cycle(4);
    let mut session = ready(&sampler, 3);
    session.generate_biclique(&sampler, 2).unwrap();

    // Answer computed for the previous K(3,3).
    sampler.push_update(Ok(accepted(constant(6, "1"), 5, "1", &[])));
    let outcome = orchestrator(&sampler, UpdateMode::Regular).step_once(&mut session);

    assert!(matches!(outcome, UpdateOutcome::Failed(StepError::DomainMismatch(_))));
    assert_eq!(session.chain().len(), 1);
    assert_eq!(session.chain().current(), Some(&constant(4, "0")));
}

#[test]
fn test_rejected_step_highlights_attempt() {
    let sampler = ScriptedSampler::with_cycle(4);
    let mut session = ready(&sampler, 2);
    sampler.push_update(Ok(rejected(constant(4, "0"), 3, None)));

    let outcome = orchestrator(&sampler, UpdateMode::Neighbourhood).step_once(&mut session);
    assert!(matches!(outcome, UpdateOutcome::Rejected { .. }));
    assert!(outcome.notice().is_some());
    assert_eq!(session.chain().len(), 1);
    assert_eq!(session.selection().selected_s, Some(VertexId::biclique(3)));
    assert_eq!(session.selection().selected_g, None);
}

#[test]
fn test_homomorphic_edges_namespaced_to_target() {
    let sampler = ScriptedSampler::with_cycle(4);
    let mut session = ready(&sampler, 1);
    sampler.push_update(Ok(accepted(constant(2, "0"), 0, "0", &[("0", "1")])));
    orchestrator(&sampler, UpdateMode::Regular).step_once(&mut session);

    let edges = &session.selection().homomorphic_edges;
    assert!(edges.contains(&Edge::new(VertexId::target("1"), VertexId::target("0"))));
    assert!(!edges.contains(&Edge::new(VertexId::biclique(0), VertexId::biclique(1))));
}

struct CancelAfter {
    token: CancelToken,
    after: u32,
    redraws: Cell<u32>,
}

impl RenderSink for CancelAfter {
    fn request_redraw(&self) {
        self.redraws.set(self.redraws.get() + 1);
    }

    fn step_finished(&self, step: u32, _outcome: &UpdateOutcome) {
        if step + 1 == self.after {
            self.token.cancel();
        }
    }
}

#[test]
fn test_cancel_stops_before_next_request() {
    let sampler = ScriptedSampler::with_cycle(3);
    let mut session = ready(&sampler, 1);
    for _ in 0..10 {
        sampler.push_update(Ok(accepted(constant(2, "1"), 0, "1", &[])));
    }
    let sink = CancelAfter {
        token: CancelToken::new(),
        after: 3,
        redraws: Cell::new(0),
    };

    let tally = orchestrator(&sampler, UpdateMode::Regular)
        .step_many(&mut session, 10, &sink.token, &sink)
        .unwrap();
    assert!(tally.cancelled);
    assert_eq!(tally.completed(), 3);
    assert_eq!(sampler.calls(), 3);
    assert_eq!(sink.redraws.get(), 3);
}

#[test]
fn test_shared_session_run_on_worker_thread() {
    let sampler = Arc::new(ScriptedSampler::with_cycle(3));
    let mut shared = ready(&sampler, 1).into_shared();
    for _ in 0..5 {
        sampler.push_update(Ok(accepted(constant(2, "2"), 1, "2", &[])));
    }

    let worker = {
        let sampler = Arc::clone(&sampler);
        let mut shared = Arc::clone(&shared);
        thread::spawn(move || {
            UpdateOrchestrator::new(sampler, UpdateMode::Regular)
                .with_pause(Duration::from_millis(1))
                .step_many(&mut shared, 5, &CancelToken::new(), &NullSink)
        })
    };
    let tally = worker.join().unwrap().unwrap();

    assert_eq!(tally.succeeded, 5);
    assert_eq!(shared.with_session(|s| s.chain().len()), 6);
    assert_eq!(
        shared.with_session(|s| s.check_sync(&sampler)),
        Ok(homomorphism::SyncStatus::InSync)
    );
}

#[derive(Debug, Clone, Copy)]
enum Answer {
    Move,
    NoMove,
    Unreachable,
}

fn answer() -> impl Strategy<Value = Answer> {
    prop_oneof![Just(Answer::Move), Just(Answer::NoMove), Just(Answer::Unreachable)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_history_grows_only_on_accepted_steps(script in prop::collection::vec(answer(), 0..40)) {
        let sampler = ScriptedSampler::with_cycle(3);
        let mut session = ready(&sampler, 1);
        for (i, a) in script.iter().enumerate() {
            let image = (i % 3).to_string();
            let reply = match a {
                Answer::Move => Ok(accepted(constant(2, &image), 0, &image, &[])),
                Answer::NoMove => Ok(rejected(constant(2, &image), 1, None)),
                Answer::Unreachable => Err(connection_refused("/update_homomorphism")),
            };
            sampler.push_update(reply);
        }

        let orch = orchestrator(&sampler, UpdateMode::Regular);
        let mut accepted_steps = 0;
        for _ in &script {
            if orch.step_once(&mut session).is_success() {
                accepted_steps += 1;
            }
        }

        let moves = script.iter().filter(|a| matches!(a, Answer::Move)).count();
        prop_assert_eq!(accepted_steps, moves);
        prop_assert_eq!(session.chain().len(), 1 + moves);
        prop_assert_eq!(sampler.calls(), script.len());
    }
}

//! What the examples print, captured through a `tracing` subscriber.

use std::{
    io,
    sync::{Arc, Mutex},
};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use wait_demo::{
    simulator::ScriptedDurations, DispatchError, Dispatcher, EventLoop, SelectorToken, Session,
    WaitSimulator, WaitStrategy,
};

const POLL: WaitStrategy = WaitStrategy::Poll { interval_ms: 5 };

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[derive(Debug)]
struct Line {
    level: String,
    message: String,
}

impl Captured {
    fn lines(&self) -> Vec<Line> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter_map(|line| {
                let (level, message) = line.trim_start().split_once(' ')?;
                Some(Line {
                    level: level.to_string(),
                    message: message.to_string(),
                })
            })
            .collect()
    }
}

fn capture<R>(max_level: Level, f: impl FnOnce() -> R) -> (R, Vec<Line>) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_max_level(max_level)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, captured.lines())
}

fn dispatch(
    selector: Option<&str>,
    durations: &[u64],
    strategy: WaitStrategy,
) -> (Result<(), DispatchError>, Vec<Line>) {
    let durations = durations.to_vec();

    capture(Level::INFO, move || {
        let dispatcher = Dispatcher::builtin().unwrap();
        let event_loop = EventLoop::start().unwrap();
        let simulator =
            WaitSimulator::with_source(1000, ScriptedDurations::new(durations)).unwrap();
        let session = Session::new(event_loop.spawner(), simulator, strategy);

        let token = selector.map(SelectorToken::from_number);
        let dispatched = dispatcher.dispatch(token.as_ref(), &session);
        event_loop.drain().unwrap();
        dispatched
    })
}

fn run_example(number: u32, durations: &[u64], strategy: WaitStrategy) -> Vec<Line> {
    let (dispatched, lines) = dispatch(Some(number.to_string().as_str()), durations, strategy);
    dispatched.unwrap();
    lines
}

fn position(lines: &[Line], message: &str) -> usize {
    lines
        .iter()
        .position(|line| line.message == message)
        .unwrap_or_else(|| panic!("{message:?} not logged in {lines:#?}"))
}

fn errors(lines: &[Line]) -> Vec<&str> {
    lines
        .iter()
        .filter(|line| line.level == "ERROR")
        .map(|line| line.message.as_str())
        .collect()
}

#[test]
fn sequential_examples_log_five_rounds_then_end() {
    let durations = [30, 10, 20, 40, 5];

    for (number, strategy) in [(9, WaitStrategy::Notify), (10, WaitStrategy::Notify), (10, POLL)] {
        let lines = run_example(number, &durations, strategy);

        let trace: Vec<_> = lines
            .iter()
            .map(|line| line.message.as_str())
            .filter(|m| m.starts_with("waiting for") || m.starts_with("resolved:") || *m == "end")
            .collect();

        // A round only starts once the previous one has resolved.
        let mut expected = Vec::new();
        for ms in durations {
            expected.push(format!("waiting for {ms} ms..."));
            expected.push(format!("resolved: {ms}"));
        }
        expected.push("end".to_string());

        assert_eq!(trace, expected, "ex{number} with {strategy:?}");
    }
}

#[test]
fn dispatch_logs_separator_and_routine_name() {
    let lines = run_example(1, &[15], WaitStrategy::Notify);

    assert_eq!(lines[0].message, wait_demo::dispatch::SEPARATOR);
    assert_eq!(lines[1].message, "Calling ex1() ...");
}

#[test]
fn resolving_examples_log_the_drawn_duration() {
    for number in [1, 4, 6] {
        let lines = run_example(number, &[15], WaitStrategy::Notify);

        position(&lines, "waiting for 15 ms...");
        let resolved = position(&lines, "resolved: 15");
        assert!(position(&lines, "15 ms passed, resolving") < resolved);
        assert!(errors(&lines).is_empty(), "ex{number}");
    }
}

#[test]
fn rejecting_examples_log_exactly_one_error() {
    for number in [2, 3, 5] {
        let lines = run_example(number, &[40], WaitStrategy::Notify);

        assert_eq!(errors(&lines), vec!["rejected: 40"], "ex{number}");
        assert!(lines
            .iter()
            .all(|line| line.message != "you should not see this"));
    }
}

#[test]
fn blocking_example_logs_the_stored_value() {
    for strategy in [WaitStrategy::Notify, POLL] {
        let lines = run_example(7, &[70], strategy);

        let resolved: Vec<_> = lines
            .iter()
            .filter(|line| line.message.starts_with("resolved:"))
            .collect();
        assert_eq!(resolved.len(), 1);
        assert!(
            resolved[0].message.starts_with("resolved: 70"),
            "{:?}",
            resolved[0]
        );
    }
}

#[test]
fn blocking_rejection_logs_before_end() {
    let lines = run_example(8, &[25], POLL);

    assert_eq!(errors(&lines), vec!["rejected: 25"]);
    let rejected = lines
        .iter()
        .position(|line| line.message == "rejected: 25")
        .unwrap();
    assert!(rejected < position(&lines, "end"));
}

#[test]
fn join_all_logs_durations_in_submission_order() {
    let lines = run_example(11, &[50, 10, 40, 30, 20], WaitStrategy::Notify);

    let durations = position(&lines, "durations: [50, 10, 40, 30, 20]");
    assert!(durations < position(&lines, "end"));
}

#[test]
fn join_all_reports_the_rejecting_wait_and_siblings_keep_running() {
    let lines = run_example(12, &[100, 200, 20, 300, 400], WaitStrategy::Notify);

    let rejected = position(&lines, "rejected duration: 20");
    let end = position(&lines, "end");
    assert_eq!(end, rejected + 1);
    assert!(position(&lines, "400 ms passed, resolving") > end);
    assert_eq!(
        lines
            .iter()
            .filter(|line| line.message.starts_with("rejected duration"))
            .count(),
        1
    );
}

#[test]
fn race_reports_the_earliest_timer() {
    let lines = run_example(13, &[200, 300, 20, 250, 400], WaitStrategy::Notify);
    assert_eq!(position(&lines, "end"), position(&lines, "rejected duration: 20") + 1);

    let lines = run_example(13, &[10, 200, 150, 300, 400], WaitStrategy::Notify);
    assert_eq!(position(&lines, "end"), position(&lines, "durations: 10") + 1);
    assert!(lines
        .iter()
        .all(|line| !line.message.starts_with("rejected duration")));
}

#[test]
fn unknown_selector_logs_one_error() {
    let (dispatched, lines) = dispatch(Some("99"), &[], WaitStrategy::Notify);

    assert!(matches!(dispatched, Err(DispatchError::UnknownExample(_))));
    assert_eq!(errors(&lines), vec!["ex99 is not defined"]);
    position(&lines, "Calling ex99() ...");
}

#[test]
fn missing_selector_logs_one_error() {
    let (dispatched, lines) = dispatch(None, &[], WaitStrategy::Notify);

    assert!(matches!(dispatched, Err(DispatchError::MissingSelector(13))));
    assert_eq!(errors(&lines).len(), 1);
    assert!(lines
        .iter()
        .all(|line| !line.message.starts_with("Calling")));
}

#[test]
fn settled_outcome_is_logged_as_json() {
    let (settled, lines) = capture(Level::DEBUG, || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let sim = WaitSimulator::with_source(1000, ScriptedDurations::new([12])).unwrap();
        runtime.block_on(sim.reject())
    });

    assert_eq!(settled.unwrap_err().duration_ms(), Some(12));
    assert!(
        lines.iter().any(|line| line.level == "DEBUG"
            && line.message == r#"wait settled outcome={"duration_ms":12,"succeeded":false}"#),
        "{lines:#?}"
    );
}

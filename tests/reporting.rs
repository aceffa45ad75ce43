use std::{
    io,
    sync::{Arc, Mutex},
};

use stepwise::{
    model::{Scenario, Story},
    reporter::{RecordingStoryReporter, ReporterEvent, Statistics},
    step::{OutcomeMatcher, OutcomesTable},
    Configuration, ConsoleOutput, DelegatingStoryReporter, Keywords,
    PostStoryStatisticsCollector, RunOutcome, Steps, StoryReporter as _,
    StoryRunner,
};

// Output staying readable after moving into a reporter.
#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Reported {
    console: String,
    statistics: Statistics,
    outcome: Option<RunOutcome>,
}

fn lift(configuration: &Arc<Configuration>) -> Steps<()> {
    let mut steps = Steps::new(Arc::clone(configuration), ());
    _ = steps
        .given("the lift is on floor $floor", |_: &mut (), _: i32| {})
        .when("it breaks", |_: &mut ()| -> anyhow::Result<()> {
            anyhow::bail!("cable snapped")
        })
        .then("it arrives on floor $floor", |_: &mut (), floor: i32| {
            let mut outcomes = OutcomesTable::new();
            _ = outcomes.add_outcome("floor", floor, OutcomeMatcher::equal_to(3));
            outcomes.verify()
        })
        .then("it arrives", |_: &mut ()| {});
    steps
}

fn run(configuration: Configuration, stories: &[Story]) -> Reported {
    let configuration = Arc::new(configuration);
    let buffer = Buffer::default();
    let statistics = PostStoryStatisticsCollector::new();
    let reporter = DelegatingStoryReporter::new()
        .with(ConsoleOutput::new(buffer.clone(), Keywords::default()))
        .with(statistics.clone());

    let result = StoryRunner::new(Arc::clone(&configuration))
        .with_steps(lift(&configuration))
        .with_reporter(reporter)
        .run_stories(stories);

    Reported {
        console: buffer.text(),
        statistics: statistics.statistics(),
        outcome: match result {
            Ok(outcome) => Some(outcome),
            Err(e) => e.outcome().cloned(),
        },
    }
}

fn ride(steps: &[&str]) -> Story {
    Story::new("lift.story")
        .scenario(Scenario::new("ride").steps(steps.iter().copied()))
}

#[test]
fn writes_and_counts_a_failing_story() {
    let reported = run(
        Configuration::default(),
        &[ride(&["Given the lift is on floor 3", "When it breaks", "Then it arrives"])],
    );

    assert_eq!(
        reported.console,
        "(lift.story)\n\
         Scenario: ride\n\
         Given the lift is on floor 3\n\
         When it breaks (FAILED)\n\
         (cable snapped)\n\
         Then it arrives (NOT PERFORMED)\n\
         \n\
         \n",
    );
    assert_eq!(
        reported.statistics,
        Statistics {
            stories: 1,
            scenarios: 1,
            scenarios_failed: 1,
            steps_successful: 1,
            steps_failed: 1,
            steps_not_performed: 1,
            ..Statistics::default()
        },
    );
    assert!(reported.statistics.has_failures());
    assert_eq!(reported.outcome.unwrap().failed_stories, ["lift.story"]);
}

#[test]
fn writes_failed_outcomes_as_table() {
    let reported = run(
        Configuration::default(),
        &[ride(&["Then it arrives on floor 4"])],
    );

    assert!(
        reported.console.contains(
            "Then it arrives on floor 4 (FAILED)\n\
             |Description|Value|Matcher|Verified|\n\
             |floor|4|equal to 3|No|\n",
        ),
        "{}",
        reported.console,
    );
    assert_eq!(reported.statistics.steps_failed, 1);
}

#[test]
fn writes_pending_steps_with_their_methods() {
    let reported = run(
        Configuration::default(),
        &[ride(&["Given the lift is on floor 1", "When I am pending", "Then it arrives"])],
    );

    let console = &reported.console;
    assert!(console.contains("When I am pending (PENDING)\n"), "{console}");
    assert!(console.contains("Then it arrives (NOT PERFORMED)\n"), "{console}");
    assert!(console.contains("steps.when_with("), "{console}");
    assert!(console.contains("\"whenIAmPending\""), "{console}");
    assert_eq!(reported.statistics.scenarios_pending, 1);
    assert_eq!(reported.statistics.pending_methods, 1);
    let outcome = reported.outcome.unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.pending_steps, 1);
}

#[test]
fn writes_dry_run_without_failures() {
    let reported = run(
        Configuration::default().with_dry_run(true),
        &[ride(&["Given the lift is on floor 3", "When it breaks"])],
    );

    assert_eq!(
        reported.console,
        "(lift.story)\n\
         DRY RUN\n\
         Scenario: ride\n\
         Given the lift is on floor 3\n\
         When it breaks\n\
         \n\
         \n",
    );
    assert!(!reported.statistics.has_failures());
}

#[test]
fn keeps_output_of_concurrent_stories_together() {
    let stories = (1..=5)
        .map(|floor| {
            Story::new(format!("{floor}.story")).scenario(
                Scenario::new(format!("to {floor}"))
                    .step(format!("Given the lift is on floor {floor}"))
                    .step("Then it arrives"),
            )
        })
        .collect::<Vec<_>>();

    let reported = run(Configuration::default().with_threads(3), &stories);

    let blocks = reported
        .console
        .split("\n\n\n")
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>();
    assert_eq!(blocks.len(), 5, "{}", reported.console);
    for block in blocks {
        let floor = block
            .strip_prefix('(')
            .and_then(|b| b.split_once(".story)"))
            .map(|(floor, _)| floor)
            .unwrap();
        assert_eq!(
            block,
            format!(
                "({floor}.story)\n\
                 Scenario: to {floor}\n\
                 Given the lift is on floor {floor}\n\
                 Then it arrives",
            ),
        );
    }
    assert_eq!(reported.statistics.stories, 5);
    assert_eq!(reported.statistics.steps_successful, 10);
}

#[test]
fn replays_recorded_events() {
    let mut recording = RecordingStoryReporter::new();
    recording.before_story(&Story::new("lift.story"), false);
    recording.before_scenario("ride");
    recording.successful("Given the lift is on floor ｟3｠");
    recording.after_scenario();
    recording.after_story(false);
    let mut console = ConsoleOutput::new(Vec::new(), Keywords::default());

    recording.replay(&mut console);

    assert!(matches!(
        recording.events()[2],
        ReporterEvent::Successful { .. },
    ));
    assert_eq!(
        String::from_utf8(console.into_inner()).unwrap(),
        "(lift.story)\nScenario: ride\nGiven the lift is on floor 3\n\n\n",
    );
}

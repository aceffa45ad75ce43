use std::{
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use stepwise::{
    model::{Lifecycle, Meta, Scenario, Story},
    CandidateSteps, Configuration, ConfigurationError, ExamplesTable, Keywords,
    MarkUnmatchedStepsAsPending, Outcome, Row, RunError, RunOutcome,
    ScenarioType, Scope, Stage, Step, StepCollector, StepType, Steps,
    StoryRunner, TracingStepMonitor,
};
use tracing_subscriber::filter::LevelFilter;

type Log = Arc<Mutex<Vec<String>>>;

fn push(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

fn lift(configuration: &Arc<Configuration>, log: &Log) -> Steps<Log> {
    let mut steps = Steps::new(Arc::clone(configuration), Arc::clone(log));
    _ = steps
        .given("the lift is on floor $floor", |log: &mut Log, floor: i32| {
            push(log, format!("on {floor}"));
        })
        .given("the lift waits $millis ms", |log: &mut Log, millis: u64| {
            thread::sleep(Duration::from_millis(millis));
            push(log, format!("waited {millis}"));
        })
        .when("I press $floor", |log: &mut Log, floor: i32| {
            push(log, format!("press {floor}"));
        })
        .when("it breaks", |_: &mut Log| -> anyhow::Result<()> {
            anyhow::bail!("cable snapped")
        })
        .when("it jams", |_: &mut Log| -> anyhow::Result<()> {
            panic!("doors jammed")
        })
        .composite(
            StepType::Given,
            "the lift is serviced on floor $floor",
            ["Given the lift is on floor <floor>", "When I press 0"],
        )
        .then("it arrives", |log: &mut Log| push(log, "arrived"));
    steps
}

fn run(
    configuration: Configuration,
    stories: &[Story],
) -> (Vec<String>, Result<RunOutcome, RunError>) {
    let configuration = Arc::new(configuration);
    let log = Log::default();
    let result = StoryRunner::new(Arc::clone(&configuration))
        .with_steps(lift(&configuration, &log))
        .run_stories(stories);
    let logged = log.lock().unwrap().clone();
    (logged, result)
}

fn story(path: &str, steps: &[&str]) -> Story {
    Story::new(path).scenario(Scenario::new("ride").steps(steps.iter().copied()))
}

#[test]
fn runs_passing_stories() {
    let (log, result) = run(
        Configuration::default(),
        &[
            story("up.story", &["Given the lift is on floor 1", "When I press 4", "Then it arrives"]),
            story("down.story", &["Given the lift is on floor 4", "When I press 1"]),
        ],
    );

    let outcome = result.unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.stories, 2);
    assert_eq!(log, ["on 1", "press 4", "arrived", "on 4", "press 1"]);
}

#[test]
fn failing_scenario_leaves_other_scenarios_running() {
    let story = Story::new("lift.story")
        .scenario(Scenario::new("broken").steps(["When it breaks", "Then it arrives"]))
        .scenario(Scenario::new("fine").steps(["When I press 2", "Then it arrives"]));

    let (log, result) = run(Configuration::default(), &[story]);

    assert_eq!(log, ["press 2", "arrived"]);
    let Err(RunError::StoriesFailed(outcome)) = result else {
        panic!("expected failed stories, got {result:?}");
    };
    assert_eq!(outcome.failed_stories, ["lift.story"]);
    assert_eq!(outcome.stories, 1);
}

#[test]
fn panicking_step_fails_like_an_error() {
    let (log, result) = run(
        Configuration::default(),
        &[story("lift.story", &["When it jams", "Then it arrives"])],
    );

    assert!(log.is_empty());
    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "1 of 1 stories failed, 0 cancelled");
}

#[test]
fn expands_composite_steps() {
    let (log, result) = run(
        Configuration::default(),
        &[story("lift.story", &["Given the lift is serviced on floor 5", "Then it arrives"])],
    );

    assert!(result.unwrap().is_success());
    assert_eq!(log, ["on 5", "press 0", "arrived"]);
}

#[test]
fn examples_rows_start_afresh() {
    let scenario = Scenario::new("rides")
        .steps(["When I press <floor>", "Then it arrives"])
        .with_examples(ExamplesTable::parse("|floor|\n|upstairs|\n|3|"));

    let (log, result) =
        run(Configuration::default(), &[Story::new("lift.story").scenario(scenario)]);

    assert_eq!(log, ["press 3", "arrived"]);
    assert!(result.is_err());
}

#[test]
fn reports_failed_stories_in_story_order() {
    let stories = (0..6)
        .map(|i| {
            let step = if i % 2 == 0 { "When it breaks" } else { "When I press 1" };
            story(&format!("{i}.story"), &[step])
        })
        .collect::<Vec<_>>();

    let (log, result) = run(Configuration::default().with_threads(4), &stories);

    assert_eq!(log.len(), 3);
    let outcome = result.unwrap_err().outcome().cloned().unwrap();
    assert_eq!(outcome.stories, 6);
    assert_eq!(outcome.failed_stories, ["0.story", "2.story", "4.story"]);
}

#[test]
fn cancels_stories_running_out_of_time() {
    let (log, result) = run(
        Configuration::default()
            .with_threads(2)
            .with_story_timeout(Some(Duration::from_millis(20))),
        &[
            story("slow.story", &["Given the lift waits 60 ms", "When I press 2"]),
            story("fast.story", &["When I press 3"]),
        ],
    );

    let mut log = log;
    log.sort();
    assert_eq!(log, ["press 3", "waited 60"]);
    let outcome = result.unwrap_err().outcome().cloned().unwrap();
    assert_eq!(outcome.cancelled_stories, ["slow.story"]);
    assert!(outcome.failed_stories.is_empty());
}

#[test]
fn fails_on_pending_steps_only_if_configured() {
    let stories = [story("lift.story", &["When I am pending", "When I am pending"])];

    let (_, lenient) = run(Configuration::default(), &stories);
    let (_, strict) = run(Configuration::default().with_fail_on_pending(true), &stories);

    let lenient = lenient.unwrap();
    assert_eq!(lenient.pending_steps, 2);
    assert_eq!(lenient.pending_methods.len(), 1);
    let Err(RunError::PendingStepsFound(outcome)) = strict else {
        panic!("expected pending steps, got {strict:?}");
    };
    assert_eq!(outcome, lenient);
}

#[test]
fn counts_failed_stories_hooks() {
    let configuration = Arc::new(Configuration::default());
    let log = Log::default();
    let mut hooks = Steps::new(Arc::clone(&configuration), Arc::clone(&log));
    _ = hooks
        .before_stories(|_: &mut Log| -> anyhow::Result<()> {
            anyhow::bail!("no power")
        })
        .after_stories(|log: &mut Log| push(log, "powered off"));

    let result = StoryRunner::new(Arc::clone(&configuration))
        .with_steps(hooks)
        .with_steps(lift(&configuration, &log))
        .run_stories(&[story("lift.story", &["When I press 1"])]);

    assert_eq!(log.lock().unwrap().as_slice(), ["press 1", "powered off"]);
    let outcome = result.unwrap_err().outcome().cloned().unwrap();
    assert_eq!(outcome.failed_hooks, 1);
    assert!(outcome.failed_stories.is_empty());
}

#[test]
fn missing_starting_word_aborts_the_run() {
    let keywords = Keywords::default().with_starting_words(StepType::When, Vec::<String>::new());

    let (log, result) = run(
        Configuration::default().with_keywords(keywords),
        &[story("lift.story", &["Given the lift is on floor 1", "When I press 2"])],
    );

    assert!(log.is_empty());
    assert!(matches!(
        result,
        Err(RunError::Configuration(ConfigurationError::StartingWordNotFound(_))),
    ));
}

#[test]
fn compiles_candidates_before_running_anything() {
    let configuration = Arc::new(Configuration::default());
    let log = Log::default();
    let mut steps = lift(&configuration, &log);
    _ = steps
        .before_stories(|log: &mut Log| push(log, "powered"))
        .when("I press $floor", |_: &mut Log, _: u8| {});

    let result = StoryRunner::new(Arc::clone(&configuration))
        .with_steps(steps)
        .run_stories(&[story("lift.story", &["When I press 2"])]);

    assert!(log.lock().unwrap().is_empty());
    assert!(matches!(
        result,
        Err(RunError::Configuration(ConfigurationError::DuplicateCandidateFound { .. })),
    ));
}

#[derive(Debug, Default)]
struct CountingCollector {
    inner: MarkUnmatchedStepsAsPending,
    scenarios: AtomicUsize,
}

impl StepCollector for CountingCollector {
    fn collect_before_or_after_stories_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        stage: Stage,
    ) -> Vec<Step> {
        self.inner.collect_before_or_after_stories_steps(providers, stage)
    }

    fn collect_before_or_after_story_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        story: &Story,
        stage: Stage,
        given_story: bool,
    ) -> Vec<Step> {
        self.inner
            .collect_before_or_after_story_steps(providers, story, stage, given_story)
    }

    fn collect_before_or_after_scenario_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        meta: &Meta,
        stage: Stage,
        scenario_type: ScenarioType,
    ) -> Vec<Step> {
        self.inner
            .collect_before_or_after_scenario_steps(providers, meta, stage, scenario_type)
    }

    fn collect_lifecycle_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        lifecycle: &Lifecycle,
        meta: &Meta,
        stage: Stage,
        scope: Scope,
    ) -> Result<Vec<Step>, ConfigurationError> {
        self.inner
            .collect_lifecycle_steps(providers, lifecycle, meta, stage, scope)
    }

    fn collect_scenario_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        steps: &[String],
        named: &Row,
    ) -> Result<Vec<Step>, ConfigurationError> {
        _ = self.scenarios.fetch_add(1, Ordering::Relaxed);
        self.inner.collect_scenario_steps(providers, steps, named)
    }
}

#[test]
fn runs_with_custom_collector() {
    let configuration = Arc::new(Configuration::default());
    let log = Log::default();
    let story = Story::new("lift.story")
        .with_lifecycle(
            Lifecycle::new().with_after(Scope::Scenario, Outcome::Any, ["Then it arrives"]),
        )
        .scenario(Scenario::new("up").step("When I press 2"))
        .scenario(Scenario::new("down").step("When I press 0"));
    let runner = StoryRunner::new(Arc::clone(&configuration))
        .with_collector(CountingCollector::default())
        .with_steps(lift(&configuration, &log));

    let outcome = runner.run_stories(&[story]).unwrap();

    assert!(outcome.is_success());
    assert_eq!(
        log.lock().unwrap().as_slice(),
        ["press 2", "arrived", "press 0", "arrived"],
    );
    assert!(format!("{runner:?}").contains("scenarios: 2"));
}

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn traces_matching_with_tracing_monitor() {
    let buffer = Buffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let (log, result) = tracing::subscriber::with_default(subscriber, || {
        run(
            Configuration::default().with_step_monitor(Arc::new(TracingStepMonitor)),
            &[story("lift.story", &["Given the lift is on floor 3"])],
        )
    });

    assert!(result.unwrap().is_success());
    assert_eq!(log, ["on 3"]);
    let traced = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(traced.contains("pattern check"), "{traced}");
    assert!(traced.contains("performing"), "{traced}");
    assert!(traced.contains("running story"), "{traced}");
}

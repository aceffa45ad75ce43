use std::sync::{Arc, Mutex};

use stepwise::{
    model::{GivenStories, Lifecycle, Meta, Scenario, Story},
    reporter::{RecordingStoryReporter, ReporterEvent},
    step::ScenarioFailure,
    Configuration, ExamplesTable, HookOptions, Outcome, RunError, RunOutcome,
    ScenarioType, Scope, StepType, Steps, StoryRunner,
};

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
        .when("I press $floor", |log: &mut Log, floor: i32| {
            push(log, format!("press {floor}"));
        })
        .when("it breaks", |_: &mut Log| -> anyhow::Result<()> {
            anyhow::bail!("cable snapped")
        })
        .then("the lift is reset", |log: &mut Log| push(log, "reset"))
        .then("the lift is parked", |log: &mut Log| push(log, "parked"));
    steps
}

fn hooks(configuration: &Arc<Configuration>, log: &Log, name: &'static str) -> Steps<Log> {
    let mut steps = Steps::new(Arc::clone(configuration), Arc::clone(log));
    _ = steps
        .before_stories(move |log: &mut Log| push(log, format!("{name}:stories")))
        .before_story(move |log: &mut Log| push(log, format!("{name}:story")))
        .before_scenario(move |log: &mut Log| push(log, format!("{name}:scenario")))
        .after_scenario(move |log: &mut Log| push(log, format!("{name}:/scenario")))
        .after_story(move |log: &mut Log| push(log, format!("{name}:/story")))
        .after_stories(move |log: &mut Log| push(log, format!("{name}:/stories")));
    steps
}

fn run(
    configuration: &Arc<Configuration>,
    providers: Vec<Steps<Log>>,
    stories: &[Story],
) -> Result<RunOutcome, RunError> {
    providers
        .into_iter()
        .fold(StoryRunner::new(Arc::clone(configuration)), |runner, steps| {
            runner.with_steps(steps)
        })
        .run_stories(stories)
}

fn logged(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn after_hooks_unwind_in_reverse_provider_order() {
    let configuration = Arc::new(Configuration::default());
    let log = Log::default();
    let story = Story::new("lift.story")
        .scenario(Scenario::new("ride").step("Given the lift is on floor 1"));

    let outcome = run(
        &configuration,
        vec![
            hooks(&configuration, &log, "1"),
            lift(&configuration, &log),
            hooks(&configuration, &log, "2"),
        ],
        &[story],
    )
    .unwrap();

    assert!(outcome.is_success());
    assert_eq!(
        logged(&log),
        [
            "1:stories",
            "2:stories",
            "1:story",
            "2:story",
            "1:scenario",
            "2:scenario",
            "on 1",
            "2:/scenario",
            "1:/scenario",
            "2:/story",
            "1:/story",
            "2:/stories",
            "1:/stories",
        ],
    );
}

#[test]
fn orders_hooks_of_the_same_steps() {
    let configuration = Arc::new(Configuration::default());
    let log = Log::default();
    let mut ordered = Steps::new(Arc::clone(&configuration), Arc::clone(&log));
    _ = ordered
        .hook(HookOptions::before_scenario().order(2), |log: &mut Log| {
            push(log, "before 2");
        })
        .hook(HookOptions::before_scenario().order(1), |log: &mut Log| {
            push(log, "before 1");
        })
        .hook(HookOptions::after_scenario().order(1), |log: &mut Log| {
            push(log, "after 1");
        })
        .hook(HookOptions::after_scenario().order(2), |log: &mut Log| {
            push(log, "after 2");
        });
    let story = Story::new("lift.story")
        .scenario(Scenario::new("ride").step("Given the lift is on floor 1"));

    _ = run(&configuration, vec![ordered, lift(&configuration, &log)], &[story])
        .unwrap();

    assert_eq!(
        logged(&log),
        ["before 1", "before 2", "on 1", "after 2", "after 1"],
    );
}

#[test]
fn after_hooks_run_upon_their_outcome() {
    let configuration = Arc::new(Configuration::default());
    let outcomes = |log: &Log| {
        let mut steps = Steps::new(Arc::clone(&configuration), Arc::clone(log));
        _ = steps
            .hook(
                HookOptions::after_scenario().outcome(Outcome::Any),
                |log: &mut Log| push(log, "any"),
            )
            .hook(
                HookOptions::after_scenario().outcome(Outcome::Success),
                |log: &mut Log| push(log, "success"),
            )
            .hook(
                HookOptions::after_scenario().outcome(Outcome::Failure),
                |log: &mut Log, failure: ScenarioFailure| {
                    let cause =
                        failure.0.map(|f| f.cause().to_string()).unwrap_or_default();
                    push(log, format!("failure: {cause}"));
                },
            );
        steps
    };

    let passing = Log::default();
    let story = Story::new("lift.story")
        .scenario(Scenario::new("ride").step("When I press 3"));
    _ = run(
        &configuration,
        vec![outcomes(&passing), lift(&configuration, &passing)],
        &[story],
    )
    .unwrap();

    let failing = Log::default();
    let story = Story::new("lift.story")
        .scenario(Scenario::new("ride").step("When it breaks"));
    let err = run(
        &configuration,
        vec![outcomes(&failing), lift(&configuration, &failing)],
        &[story],
    )
    .unwrap_err();

    let mut passed = logged(&passing);
    passed.sort();
    assert_eq!(passed, ["any", "press 3", "success"]);
    let mut failed = logged(&failing);
    failed.sort();
    assert_eq!(failed, ["any", "failure: cable snapped"]);
    assert!(matches!(err, RunError::StoriesFailed(_)));
}

#[test]
fn lifecycle_steps_surround_every_scenario() {
    let configuration = Arc::new(Configuration::default());
    let log = Log::default();
    let meta = Meta::parse("@floor 7", "!--");
    let story = Story::new("lift.story")
        .with_lifecycle(
            Lifecycle::new()
                .with_before(Scope::Scenario, ["Given the lift is on floor <floor>"])
                .with_after(Scope::Scenario, Outcome::Success, ["Then the lift is parked"])
                .with_after(Scope::Scenario, Outcome::Failure, ["Then the lift is reset"]),
        )
        .scenario(
            Scenario::new("ride").with_meta(meta.clone()).step("When I press 2"),
        )
        .scenario(Scenario::new("accident").with_meta(meta).step("When it breaks"));

    let result = run(&configuration, vec![lift(&configuration, &log)], &[story]);

    assert!(result.is_err());
    assert_eq!(
        logged(&log),
        ["on 7", "press 2", "parked", "on 7", "reset"],
    );
}

#[test]
fn story_lifecycle_runs_once_around_scenarios() {
    let configuration = Arc::new(Configuration::default());
    let log = Log::default();
    let story = Story::new("lift.story")
        .with_lifecycle(
            Lifecycle::new()
                .with_before(Scope::Story, ["Given the lift is on floor 0"])
                .with_after(Scope::Story, Outcome::Any, ["Then the lift is parked"]),
        )
        .scenario(Scenario::new("up").step("When I press 2"))
        .scenario(Scenario::new("down").step("When I press 1"));

    _ = run(&configuration, vec![lift(&configuration, &log)], &[story]).unwrap();

    assert_eq!(logged(&log), ["on 0", "press 2", "press 1", "parked"]);
}

#[test]
fn given_story_hooks_run_around_given_stories_only() {
    let configuration = Arc::new(Configuration::default());
    let log = Log::default();
    let mut story_hooks = Steps::new(Arc::clone(&configuration), Arc::clone(&log));
    _ = story_hooks
        .before_story(|log: &mut Log| push(log, "regular"))
        .hook(HookOptions::before_story().given_story(true), |log: &mut Log| {
            push(log, "given");
        });
    let built = Story::new("built.story")
        .scenario(Scenario::new("build").step("Given the lift is on floor 0"));
    let story = Story::new("lift.story")
        .with_given_stories(GivenStories::new([built]))
        .scenario(Scenario::new("ride").step("When I press 2"));

    _ = run(
        &configuration,
        vec![story_hooks, lift(&configuration, &log)],
        &[story],
    )
    .unwrap();

    assert_eq!(logged(&log), ["regular", "given", "on 0", "press 2"]);
}

#[test]
fn scenario_hooks_follow_the_scenario_type() {
    let configuration = Arc::new(Configuration::default());
    let log = Log::default();
    let mut typed = Steps::new(Arc::clone(&configuration), Arc::clone(&log));
    _ = typed
        .before_scenario(|log: &mut Log| push(log, "normal"))
        .hook(
            HookOptions::before_scenario().scenario_type(ScenarioType::Example),
            |log: &mut Log| push(log, "example"),
        )
        .hook(
            HookOptions::before_scenario().scenario_type(ScenarioType::Any),
            |log: &mut Log| push(log, "any"),
        );
    let story = Story::new("lift.story").scenario(
        Scenario::new("rides")
            .step("Given the lift is on floor <floor>")
            .with_examples(ExamplesTable::parse("|floor|\n|1|\n|2|")),
    );

    _ = run(&configuration, vec![typed, lift(&configuration, &log)], &[story])
        .unwrap();

    assert_eq!(logged(&log), ["any", "example", "on 1", "example", "on 2"]);
}

#[test]
fn hooks_read_parameters_from_meta() {
    let configuration = Arc::new(Configuration::default());
    let log = Log::default();
    let mut named = Steps::new(Arc::clone(&configuration), Arc::clone(&log));
    _ = named.hook(
        HookOptions::before_scenario().named(["shaft", "missing"]),
        |log: &mut Log, shaft: String, missing: String| {
            push(log, format!("shaft {shaft}, missing '{missing}'"));
        },
    );
    let story = Story::new("lift.story")
        .with_meta(Meta::parse("@shaft east", "!--"))
        .scenario(Scenario::new("ride").step("When I press 2"));

    _ = run(&configuration, vec![named, lift(&configuration, &log)], &[story])
        .unwrap();

    assert_eq!(logged(&log), ["shaft east, missing ''", "press 2"]);
}

#[test]
fn composites_in_lifecycle_expand_upon_their_outcome_only() {
    let configuration = Arc::new(Configuration::default());
    let run_recorded = |scenario_step: &str| {
        let log = Log::default();
        let mut steps = lift(&configuration, &log);
        _ = steps
            .composite(StepType::Then, "the lift is recovered", ["Given the lift is on floor 9"])
            .composite(StepType::Then, "the lift is tidied", ["Then the lift is parked"]);
        let story = Story::new("lift.story")
            .with_lifecycle(
                Lifecycle::new()
                    .with_after(Scope::Scenario, Outcome::Failure, ["Then the lift is recovered"])
                    .with_after(Scope::Scenario, Outcome::Success, ["Then the lift is tidied"]),
            )
            .scenario(Scenario::new("ride").step(scenario_step));
        let recording = Arc::new(Mutex::new(RecordingStoryReporter::new()));
        _ = StoryRunner::new(Arc::clone(&configuration))
            .with_steps(steps)
            .with_shared_reporter(recording.clone())
            .run_stories(&[story]);
        let events = recording.lock().unwrap().take_events();
        (logged(&log), events)
    };
    let reported = |events: &[ReporterEvent]| {
        events
            .iter()
            .filter_map(|e| match e {
                ReporterEvent::BeforeStep { step } => Some(step.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
    };

    let (passed, events) = run_recorded("Given the lift is on floor 1");
    assert_eq!(passed, ["on 1", "parked"]);
    assert!(!reported(&events).iter().any(|s| s.contains("floor 9")));

    let (failed, events) = run_recorded("When it breaks");
    assert!(failed.is_empty());
    assert!(!reported(&events).iter().any(|s| s.contains("parked")));
    assert!(!events.iter().any(|e| matches!(
        e,
        ReporterEvent::NotPerformed { step } if step == "Then the lift is parked",
    )));
}

use stepwise::{Options, invoke};
use stepwise_test_utils::builders::{FlagTask, collection_of};
use stepwise_test_utils::{CapturedLogs, Recorder, init_tracing};

#[tokio::test]
async fn dry_run_logs_instead_of_running() {
    init_tracing();
    let recorder = Recorder::new();
    let leaf = FlagTask::new("leaf", &recorder);
    let top = FlagTask::new("top", &recorder);
    let root = top.decl(vec![leaf.decl(vec![])]);

    let logs = CapturedLogs::new();
    let options = Options::default().dry_run(true).dispatch(logs.dispatch());
    let root = invoke(root, &options).await.expect("run");

    assert!(recorder.events().is_empty());
    assert!(!root.ready());

    let text = logs.contents();
    assert!(text.contains("SKIPPING (DRY RUN)"), "{text}");
    assert!(!text.contains("Executing"), "{text}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_events_go_to_the_injected_dispatcher() {
    let recorder = Recorder::new();
    let missing = FlagTask::new("missing box", &recorder);
    let leaf = FlagTask::new("leaf", &recorder);
    let root = collection_of("all", vec![leaf.decl(vec![]), missing.external()]);

    let logs = CapturedLogs::new();
    let options = Options::default().workers(2).dispatch(logs.dispatch());
    invoke(root, &options).await.expect("run");

    let text = logs.contents();
    for expected in [
        "Task Graph",
        "Execution",
        "Executing",
        "Not ready [external asset]",
        "Requires:",
        "✔ leaf",
        "✖ missing box",
        "run_id",
    ] {
        assert!(text.contains(expected), "missing {expected:?} in:\n{text}");
    }
}

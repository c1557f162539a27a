use std::time::Duration;

use stepwise::{Options, invoke};
use stepwise_test_utils::builders::{FlagTask, collection_of};
use stepwise_test_utils::{Recorder, init_tracing, with_timeout};

/// root -> {dependent -> broken, sibling}
fn workflow(recorder: &Recorder) -> (FlagTask, FlagTask, FlagTask, stepwise::Decl) {
    let broken = FlagTask::new("broken", recorder).failing();
    let dependent = FlagTask::new("dependent", recorder);
    let sibling = FlagTask::new("sibling", recorder);
    let root = collection_of(
        "root",
        vec![
            dependent.decl(vec![broken.decl(vec![])]),
            sibling.decl(vec![]),
        ],
    );
    (broken, dependent, sibling, root)
}

async fn check_isolation(options: Options) {
    let recorder = Recorder::new();
    let (broken, dependent, sibling, root) = workflow(&recorder);

    let root = with_timeout(invoke(root, &options))
        .await
        .expect("task failures are not returned as errors");

    assert!(!broken.is_set());
    assert_eq!(recorder.count("broken"), 1);
    assert_eq!(recorder.count("dependent"), 0, "dependent must not run");
    assert!(!dependent.is_set());
    assert!(sibling.is_set(), "unrelated work still runs");
    assert!(!root.ready());
}

#[tokio::test]
async fn failure_is_isolated_sequentially() {
    init_tracing();
    check_isolation(Options::default()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failure_is_isolated_concurrently() {
    init_tracing();
    check_isolation(Options::default().workers(3)).await;
}

#[tokio::test]
async fn failed_task_is_retried_on_the_next_run() {
    init_tracing();
    let recorder = Recorder::new();
    let (_, _, _, root) = workflow(&recorder);
    invoke(root, &Options::default()).await.expect("first run");

    let (_, _, _, root) = workflow(&recorder);
    invoke(root, &Options::default()).await.expect("second run");

    assert_eq!(recorder.count("broken"), 2);
    // The sibling from the second workflow has a fresh flag, so it runs again.
    assert_eq!(recorder.count("sibling"), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timed_out_task_counts_as_failed() {
    init_tracing();
    let recorder = Recorder::new();
    let slow = FlagTask::new("slow", &recorder).slow(Duration::from_millis(800));
    let after = FlagTask::new("after", &recorder);
    let root = after.decl(vec![slow.decl(vec![])]);

    let options = Options::default().task_timeout(Duration::from_millis(50));
    let root = with_timeout(invoke(root, &options)).await.expect("run");

    assert!(!root.ready());
    assert_eq!(recorder.count("after"), 0);
}

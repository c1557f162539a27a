use std::path::Path;

use stepwise::{Decl, Options, Shape, invoke};
use stepwise_test_utils::builders::file_task;
use stepwise_test_utils::{Recorder, init_tracing, with_timeout};

fn file_a(dir: &Path, recorder: &Recorder) -> Decl {
    file_task(&dir.join("a"), recorder, vec![])
}

fn file_b(dir: &Path, recorder: &Recorder) -> Decl {
    file_task(&dir.join("b"), recorder, vec![file_a(dir, recorder)])
}

fn bundle(dir: &Path, recorder: &Recorder) -> Decl {
    file_task(&dir.join("bundle"), recorder, vec![file_b(dir, recorder)])
}

fn name(dir: &Path, file: &str) -> String {
    format!("file {}", dir.join(file).display())
}

#[tokio::test]
async fn first_run_creates_files_bottom_up() {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let recorder = Recorder::new();

    let root = with_timeout(invoke(bundle(dir.path(), &recorder), &Options::default()))
        .await
        .expect("run succeeds");

    assert!(root.ready());
    assert_eq!(
        recorder.events(),
        vec![
            name(dir.path(), "a"),
            name(dir.path(), "b"),
            name(dir.path(), "bundle"),
        ]
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("b")).expect("b exists"),
        name(dir.path(), "b")
    );
    assert_eq!(
        root.refs(),
        serde_json::json!(dir.path().join("bundle").to_string_lossy())
    );
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");

    let first = Recorder::new();
    invoke(bundle(dir.path(), &first), &Options::default())
        .await
        .expect("first run");
    assert_eq!(first.events().len(), 3);

    let second = Recorder::new();
    let root = invoke(bundle(dir.path(), &second), &Options::default())
        .await
        .expect("second run");
    assert!(root.ready());
    assert!(second.events().is_empty());
}

#[tokio::test]
async fn duplicate_requirement_slots_run_one_body() {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let recorder = Recorder::new();

    let (d, r) = (dir.path().to_path_buf(), recorder.clone());
    let both = Decl::collection("both").requires(move |run| {
        Ok(Shape::List(vec![
            run.require(file_a(&d, &r))?,
            run.require(file_a(&d, &r))?,
        ]))
    });

    let root = invoke(both, &Options::default()).await.expect("run");

    assert_eq!(recorder.count(&name(dir.path(), "a")), 1);
    assert!(root.ready());
    let reqs = root.requirements();
    assert!(reqs.at(0).expect("slot 0").ready());
    assert!(reqs.at(1).expect("slot 1").ready());
}

use stepwise::demo::{a_cup_of_tea, catalog};
use stepwise::{Options, invoke, reify};
use stepwise_test_utils::init_tracing;

#[tokio::test]
async fn tea_waits_for_the_box_of_tea_bags() {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().to_path_buf();

    // No tea bags yet: only the cup can be made.
    let root = invoke(a_cup_of_tea(&base), &Options::default())
        .await
        .expect("first run");
    assert!(!root.ready());
    assert!(base.join("cup").is_dir());
    assert!(!base.join("cup/tea").exists());

    std::fs::write(base.join("box-of-tea"), b"").expect("buy tea");

    // Tea bag and water go in; the tea then has to steep.
    let root = invoke(a_cup_of_tea(&base), &Options::default().workers(2))
        .await
        .expect("second run");
    assert!(!root.ready());
    assert!(base.join("cup/tea").exists());
    assert!(base.join("cup/water").exists());
    assert!(!base.join("cup/sugar").exists());
}

#[tokio::test]
async fn catalog_builds_tasks_from_cli_arguments() {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let arg = reify(&dir.path().to_string_lossy());

    let decl = catalog().build("cup", &[arg]).expect("known task");
    let root = invoke(decl, &Options::default()).await.expect("run");

    assert!(root.ready());
    assert!(dir.path().join("cup").is_dir());
}

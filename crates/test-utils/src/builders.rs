#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use stepwise::{Asset, Decl, Shape};

use crate::Recorder;

fn require_all(decl: Decl, reqs: Vec<Decl>) -> Decl {
    decl.requires(move |run| {
        let nodes = reqs
            .into_iter()
            .map(|req| run.require(req))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Shape::List(nodes))
    })
}

/// A task whose asset is `path`, created (containing the task name) by its
/// body.
pub fn file_task(path: &Path, recorder: &Recorder, reqs: Vec<Decl>) -> Decl {
    let name = format!("file {}", path.display());
    let target = path.to_path_buf();
    let recorder = recorder.clone();
    let body_name = name.clone();
    require_all(Decl::task(&name).asset(Asset::file(path)), reqs).body(move || {
        recorder.record(&body_name);
        std::fs::write(&target, body_name.as_bytes())?;
        Ok(())
    })
}

/// Shared state behind a flag-backed task: ready once its body has run.
///
/// Calling [`FlagTask::decl`] twice yields two declarations of the same task,
/// which is how tests exercise deduplication.
#[derive(Debug, Clone)]
pub struct FlagTask {
    name: String,
    flag: Arc<AtomicBool>,
    recorder: Recorder,
    delay: Option<Duration>,
    fail: bool,
}

impl FlagTask {
    pub fn new(name: &str, recorder: &Recorder) -> Self {
        Self {
            name: name.to_string(),
            flag: Arc::new(AtomicBool::new(false)),
            recorder: recorder.clone(),
            delay: None,
            fail: false,
        }
    }

    /// Sleep this long in the body before setting the flag.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make the body return an error instead of setting the flag.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn decl(&self, reqs: Vec<Decl>) -> Decl {
        let observed = Arc::clone(&self.flag);
        let asset = Asset::new(self.name.clone(), move || observed.load(Ordering::SeqCst));
        let this = self.clone();
        require_all(Decl::task(&self.name).asset(asset), reqs).body(move || {
            this.recorder.record(&this.name);
            if let Some(delay) = this.delay {
                std::thread::sleep(delay);
            }
            if this.fail {
                anyhow::bail!("{} failed on purpose", this.name);
            }
            this.set();
            Ok(())
        })
    }

    /// An external task observing the same flag; the workflow cannot set it.
    pub fn external(&self) -> Decl {
        let observed = Arc::clone(&self.flag);
        Decl::external(&self.name)
            .asset(Asset::new(self.name.clone(), move || observed.load(Ordering::SeqCst)))
    }
}

/// A collection grouping `reqs` under `name`.
pub fn collection_of(name: &str, reqs: Vec<Decl>) -> Decl {
    require_all(Decl::collection(name), reqs)
}

/// Events emitted while a batch is traced, rendered by front ends as they see fit.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// One of several batches of the same scene is starting; `index` is zero-based.
    BatchStart { index: usize, total: usize },
    BatchFinish,

    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total: u64 },
    TaskIncrement { amount: u64 },
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Optional sink for [`Progress`] events. The default reporter drops everything.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_forwards_events_to_callback_in_order() {
        let events = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|e| {
                events.lock().unwrap().push(e);
            }));
            reporter.report(Progress::PhaseStart { name: "Sampling" });
            reporter.report(Progress::TaskIncrement { amount: 3 });
            reporter.report(Progress::PhaseFinish);
        }
        let events = events.into_inner().unwrap();
        assert_eq!(
            events,
            vec![
                Progress::PhaseStart { name: "Sampling" },
                Progress::TaskIncrement { amount: 3 },
                Progress::PhaseFinish,
            ]
        );
    }

    #[test]
    fn default_reporter_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("nobody listens".to_string()));
    }
}

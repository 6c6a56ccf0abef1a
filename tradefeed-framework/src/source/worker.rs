use super::{FeedSource, FetchError, FetchOutcome, FetchRequest};
use anyhow::Result;
use std::{sync::Arc, thread};
use tokio::{
    runtime::Builder,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

const WORKER_THREADS: usize = 2;

/// Runs fetches on a background tokio runtime and hands outcomes back to the
/// UI thread.
///
/// Every submitted request yields exactly one [`FetchOutcome`], including
/// requests whose task panicked and requests submitted after [`stop`].
///
/// [`stop`]: FetchWorker::stop
pub struct FetchWorker {
    requests: Option<UnboundedSender<FetchRequest>>,
    outcome_tx: UnboundedSender<FetchOutcome>,
    outcomes: UnboundedReceiver<FetchOutcome>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl FetchWorker {
    pub fn spawn(source: Arc<dyn FeedSource>) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name("tradefeed-fetch")
            .enable_all()
            .build()?;

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let serve_tx = outcome_tx.clone();

        let handle = thread::Builder::new()
            .name("tradefeed-fetch-driver".to_string())
            .spawn(move || {
                log::debug!("Fetch worker started");
                runtime.block_on(Self::serve(source, request_rx, serve_tx));
                log::debug!("Fetch worker stopped");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            outcome_tx,
            outcomes: outcome_rx,
            thread_handle: Some(handle),
        })
    }

    async fn serve(
        source: Arc<dyn FeedSource>,
        mut requests: UnboundedReceiver<FetchRequest>,
        outcomes: UnboundedSender<FetchOutcome>,
    ) {
        while let Some(request) = requests.recv().await {
            let source = Arc::clone(&source);
            let outcomes = outcomes.clone();
            tokio::spawn(async move {
                let outcome = Self::run_request(source, request).await;
                if outcomes.send(outcome).is_err() {
                    log::debug!("Fetch outcome dropped, receiver is gone");
                }
            });
        }
    }

    /// Executes one request; a panicking source still produces an outcome.
    pub(crate) async fn run_request(
        source: Arc<dyn FeedSource>,
        request: FetchRequest,
    ) -> FetchOutcome {
        let task = tokio::spawn({
            let request = request.clone();
            async move { request.execute(source.as_ref()).await }
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Fetch task failed: {}", e);
                request.failed(FetchError::Aborted(e.to_string()))
            }
        }
    }

    pub fn submit(&self, request: FetchRequest) {
        let request = match &self.requests {
            Some(tx) => match tx.send(request) {
                Ok(()) => return,
                Err(mpsc::error::SendError(request)) => request,
            },
            None => request,
        };

        log::warn!("Fetch worker is not running, failing request");
        let _ = self
            .outcome_tx
            .send(request.failed(FetchError::Aborted("fetch worker stopped".to_string())));
    }

    /// Non-blocking: returns the next finished outcome, if any.
    pub fn try_recv(&mut self) -> Option<FetchOutcome> {
        self.outcomes.try_recv().ok()
    }

    /// Stops accepting requests, drops in-flight fetches and joins the thread.
    pub fn stop(&mut self) {
        self.requests.take();

        if let Some(handle) = self.thread_handle.take() {
            log::debug!("Waiting for fetch worker to finish...");
            if let Err(e) = handle.join() {
                log::error!("Fetch worker panicked: {:?}", e);
            }
        }
    }
}

impl Drop for FetchWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::SessionToken,
        record::{Record, RecordKind},
        source::MessageQuery,
        view_state::{Granularity, ViewState},
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::time::{Duration, Instant};

    struct FixedSource;

    #[async_trait]
    impl FeedSource for FixedSource {
        async fn fetch_messages(&self, query: &MessageQuery) -> Result<Vec<Record>, FetchError> {
            let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            Ok(vec![Record::new(ts, RecordKind::Trade, format!("limit={}", query.limit))])
        }

        async fn fetch_in_progress(
            &self,
            _granularity: Granularity,
        ) -> Result<Option<Record>, FetchError> {
            Err(FetchError::Status { code: 503 })
        }
    }

    struct PanickingSource;

    #[async_trait]
    impl FeedSource for PanickingSource {
        async fn fetch_messages(&self, _query: &MessageQuery) -> Result<Vec<Record>, FetchError> {
            panic!("source blew up");
        }

        async fn fetch_in_progress(
            &self,
            _granularity: Granularity,
        ) -> Result<Option<Record>, FetchError> {
            Ok(None)
        }
    }

    fn older_request() -> FetchRequest {
        FetchRequest::Older {
            session: SessionToken::first(),
            query: MessageQuery::new(ViewState::default(), 20, None),
        }
    }

    fn wait_for_outcome(worker: &mut FetchWorker) -> Option<FetchOutcome> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(outcome) = worker.try_recv() {
                return Some(outcome);
            }
            thread::sleep(Duration::from_millis(10));
        }
        None
    }

    #[tokio::test]
    async fn test_run_request_reports_panics_as_aborted() {
        let outcome = FetchWorker::run_request(Arc::new(PanickingSource), older_request()).await;
        match outcome {
            FetchOutcome::Older { session, result } => {
                assert_eq!(session, SessionToken::first());
                assert!(matches!(result, Err(FetchError::Aborted(_))));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_request_in_progress_error() {
        let request = FetchRequest::InProgress {
            generation: 7,
            granularity: Granularity::OneHour,
        };
        let outcome = FetchWorker::run_request(Arc::new(FixedSource), request).await;
        assert_eq!(
            outcome,
            FetchOutcome::InProgress {
                generation: 7,
                result: Err(FetchError::Status { code: 503 }),
            }
        );
    }

    #[test]
    fn test_worker_delivers_outcome() {
        let mut worker = FetchWorker::spawn(Arc::new(FixedSource)).unwrap();
        worker.submit(older_request());

        match wait_for_outcome(&mut worker) {
            Some(FetchOutcome::Older { result: Ok(records), .. }) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].content, "limit=20");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        worker.stop();
    }

    #[test]
    fn test_submit_after_stop_still_answers() {
        let mut worker = FetchWorker::spawn(Arc::new(FixedSource)).unwrap();
        worker.stop();
        worker.submit(older_request());

        match worker.try_recv() {
            Some(FetchOutcome::Older { result: Err(FetchError::Aborted(_)), .. }) => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}

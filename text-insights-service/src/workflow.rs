use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use analysis_flow::{
    FlowError, Pipeline, PipelineBuilder, PipelineRunner, Session, SessionStorage,
};

use crate::client::AnalysisClient;
use crate::extract::TextExtractor;
use crate::locale::Localizer;
use crate::models::{AnalysisJob, AnalyzeRequest, JOB_KEY};
use crate::stages::{AnalyzeStage, ExtractTextStage, ResolveInputStage};

/// Assemble the analysis lifecycle: resolve input, extract text, analyze.
pub fn build_analysis_pipeline(
    locale: Arc<Localizer>,
    extractor: Arc<dyn TextExtractor>,
    client: Arc<dyn AnalysisClient>,
) -> Pipeline {
    PipelineBuilder::new("text_analysis")
        .add_stage(Arc::new(ResolveInputStage::new(locale.clone())))
        .add_stage(Arc::new(ExtractTextStage::new(extractor, locale.clone())))
        .add_stage(Arc::new(AnalyzeStage::new(client, locale)))
        .build()
}

/// Create a session for one analysis request, seeding the job state from
/// the submitted input.
pub fn create_analysis_session(request: AnalyzeRequest) -> Session {
    let mut job = AnalysisJob::new(Uuid::new_v4().to_string(), request.mode);
    job.input_text = request.text;
    job.file_path = request.file_path;

    let session = Session::with_random_id("resolve_input");
    session.context.set(JOB_KEY, &job);
    session
}

/// Drive one analysis request to settlement.
///
/// A stage failure is a user-facing outcome, not a transport error: its
/// message is published into the job state (clearing any prior result) and
/// the call returns `Ok`. Only infrastructure errors (missing session,
/// corrupt context) propagate to the caller.
pub async fn run_analysis(
    runner: &PipelineRunner,
    storage: &Arc<dyn SessionStorage>,
    session_id: &str,
) -> analysis_flow::Result<()> {
    match runner.run(session_id).await {
        Ok(report) => {
            info!(
                session = session_id,
                stage = %report.settled_stage_id,
                "analysis lifecycle completed"
            );
            Ok(())
        }
        Err(FlowError::StageFailed(message)) => {
            let session = storage
                .get(session_id)
                .await?
                .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

            if let Some(mut job) = session.context.get::<AnalysisJob>(JOB_KEY) {
                job.publish_error(message.as_str());
                session.context.set(JOB_KEY, &job);
            }
            storage.save(session).await?;

            info!(session = session_id, "analysis failed: {}", message);
            Ok(())
        }
        Err(other) => {
            error!(session = session_id, "analysis lifecycle error: {}", other);
            Err(other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_flow::{BUSY_KEY, InMemorySessionStorage};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::extract::ExtractError;
    use crate::locale::Language;
    use crate::models::{AnalysisResult, InputMode};

    enum ExtractBehavior {
        Yield(String),
        FailParse,
        FailIo,
    }

    struct CountingExtractor {
        behavior: ExtractBehavior,
        calls: Arc<AtomicUsize>,
    }

    impl TextExtractor for CountingExtractor {
        fn extract(&self, _path: &Path) -> Result<String, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                ExtractBehavior::Yield(text) => Ok(text.clone()),
                ExtractBehavior::FailParse => Err(ExtractError::Parse {
                    format: "pdf",
                    message: "bad xref table".to_string(),
                }),
                ExtractBehavior::FailIo => Err(ExtractError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "permission denied",
                ))),
            }
        }
    }

    enum ClientBehavior {
        Succeed,
        Fail(String),
    }

    struct CountingClient {
        behavior: ClientBehavior,
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Option<String>>>,
    }

    #[async_trait]
    impl AnalysisClient for CountingClient {
        async fn analyze(&self, text: &str) -> anyhow::Result<AnalysisResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = Some(text.to_string());
            match &self.behavior {
                ClientBehavior::Succeed => Ok(AnalysisResult {
                    summary: "a fine summary".to_string(),
                    keywords: vec!["alpha".to_string(), "beta".to_string()],
                }),
                ClientBehavior::Fail(message) => Err(anyhow::anyhow!("{}", message)),
            }
        }
    }

    struct Harness {
        storage: Arc<dyn SessionStorage>,
        runner: PipelineRunner,
        locale: Arc<Localizer>,
        extractor_calls: Arc<AtomicUsize>,
        client_calls: Arc<AtomicUsize>,
        client_seen: Arc<Mutex<Option<String>>>,
    }

    fn make_harness(extract: ExtractBehavior, client: ClientBehavior) -> Harness {
        let locale = Arc::new(Localizer::new());
        let extractor_calls = Arc::new(AtomicUsize::new(0));
        let client_calls = Arc::new(AtomicUsize::new(0));
        let client_seen = Arc::new(Mutex::new(None));

        let pipeline = Arc::new(build_analysis_pipeline(
            locale.clone(),
            Arc::new(CountingExtractor {
                behavior: extract,
                calls: extractor_calls.clone(),
            }),
            Arc::new(CountingClient {
                behavior: client,
                calls: client_calls.clone(),
                seen: client_seen.clone(),
            }),
        ));

        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        let runner = PipelineRunner::new(pipeline, storage.clone());

        Harness {
            storage,
            runner,
            locale,
            extractor_calls,
            client_calls,
            client_seen,
        }
    }

    fn text_request(text: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            mode: InputMode::Text,
            text: Some(text.to_string()),
            file_path: None,
        }
    }

    fn file_request(path: Option<&str>) -> AnalyzeRequest {
        AnalyzeRequest {
            mode: InputMode::File,
            text: None,
            file_path: path.map(str::to_string),
        }
    }

    async fn run_request(harness: &Harness, request: AnalyzeRequest) -> (Session, AnalysisJob) {
        let session = create_analysis_session(request);
        let session_id = session.id.clone();
        harness.storage.save(session).await.unwrap();

        run_analysis(&harness.runner, &harness.storage, &session_id)
            .await
            .unwrap();

        let stored = harness.storage.get(&session_id).await.unwrap().unwrap();
        let job = stored.context.get::<AnalysisJob>(JOB_KEY).unwrap();
        (stored, job)
    }

    #[tokio::test]
    async fn blank_text_never_reaches_the_client() {
        let harness = make_harness(
            ExtractBehavior::Yield("unused".to_string()),
            ClientBehavior::Succeed,
        );

        let (_, job) = run_request(&harness, text_request("   \n\t  ")).await;

        assert_eq!(
            job.error.as_deref(),
            Some(harness.locale.translate("error.no_text").as_str())
        );
        assert!(job.result.is_none());
        assert_eq!(harness.client_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_file_fails_before_extraction() {
        let harness = make_harness(
            ExtractBehavior::Yield("unused".to_string()),
            ClientBehavior::Succeed,
        );

        let (_, job) = run_request(&harness, file_request(None)).await;
        assert_eq!(
            job.error.as_deref(),
            Some(harness.locale.translate("error.no_file").as_str())
        );
        assert_eq!(harness.extractor_calls.load(Ordering::SeqCst), 0);

        // A blank path counts as no selection
        let (_, job) = run_request(&harness, file_request(Some("   "))).await;
        assert!(job.error.is_some());
        assert_eq!(harness.extractor_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn classified_extractor_error_surfaces_the_localized_file_read_string() {
        let harness = make_harness(ExtractBehavior::FailParse, ClientBehavior::Succeed);

        let (_, job) = run_request(&harness, file_request(Some("/tmp/report.pdf"))).await;

        let message = job.error.as_deref().unwrap();
        assert_eq!(message, harness.locale.translate("error.file_read"));
        assert!(!message.contains("bad xref table"));
        assert_eq!(harness.client_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unclassified_extractor_error_keeps_its_own_message() {
        let harness = make_harness(ExtractBehavior::FailIo, ClientBehavior::Succeed);

        let (_, job) = run_request(&harness, file_request(Some("/tmp/report.txt"))).await;

        let message = job.error.as_deref().unwrap();
        assert!(message.contains("permission denied"));
        assert_ne!(message, harness.locale.translate("error.file_read"));
    }

    #[tokio::test]
    async fn whitespace_extraction_fails_before_the_client() {
        let harness = make_harness(
            ExtractBehavior::Yield("  \n \t ".to_string()),
            ClientBehavior::Succeed,
        );

        let (_, job) = run_request(&harness, file_request(Some("/tmp/empty.pdf"))).await;

        assert_eq!(
            job.error.as_deref(),
            Some(harness.locale.translate("error.no_text_extracted").as_str())
        );
        assert_eq!(harness.extractor_calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.client_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_publishes_the_result_and_clears_a_prior_error() {
        let harness = make_harness(
            ExtractBehavior::Yield("unused".to_string()),
            ClientBehavior::Succeed,
        );

        let session = create_analysis_session(text_request("some real input"));
        let session_id = session.id.clone();
        let mut job = session.context.get::<AnalysisJob>(JOB_KEY).unwrap();
        job.publish_error("stale error from an earlier attempt");
        session.context.set(JOB_KEY, &job);
        harness.storage.save(session).await.unwrap();

        run_analysis(&harness.runner, &harness.storage, &session_id)
            .await
            .unwrap();

        let stored = harness.storage.get(&session_id).await.unwrap().unwrap();
        let job = stored.context.get::<AnalysisJob>(JOB_KEY).unwrap();
        let result = job.result.expect("result should be published");
        assert_eq!(result.summary, "a fine summary");
        assert_eq!(result.keywords, vec!["alpha", "beta"]);
        assert!(job.error.is_none());
    }

    #[tokio::test]
    async fn failure_publishes_the_error_and_clears_a_prior_result() {
        let harness = make_harness(
            ExtractBehavior::Yield("unused".to_string()),
            ClientBehavior::Fail("model exploded".to_string()),
        );

        let session = create_analysis_session(text_request("some real input"));
        let session_id = session.id.clone();
        let mut job = session.context.get::<AnalysisJob>(JOB_KEY).unwrap();
        job.publish_result(AnalysisResult {
            summary: "stale".to_string(),
            keywords: vec![],
        });
        session.context.set(JOB_KEY, &job);
        harness.storage.save(session).await.unwrap();

        run_analysis(&harness.runner, &harness.storage, &session_id)
            .await
            .unwrap();

        let stored = harness.storage.get(&session_id).await.unwrap().unwrap();
        let job = stored.context.get::<AnalysisJob>(JOB_KEY).unwrap();
        assert_eq!(job.error.as_deref(), Some("model exploded"));
        assert!(job.result.is_none());
    }

    #[tokio::test]
    async fn busy_flag_is_released_after_settlement() {
        let harness = make_harness(
            ExtractBehavior::Yield("unused".to_string()),
            ClientBehavior::Succeed,
        );
        let (session, _) = run_request(&harness, text_request("fine input")).await;
        assert_eq!(session.context.get::<bool>(BUSY_KEY), Some(false));

        let harness = make_harness(ExtractBehavior::FailParse, ClientBehavior::Succeed);
        let (session, _) = run_request(&harness, file_request(Some("/tmp/x.pdf"))).await;
        assert_eq!(session.context.get::<bool>(BUSY_KEY), Some(false));
    }

    #[tokio::test]
    async fn mode_selects_exactly_one_input_source() {
        // Text mode with a file also attached: the file is never touched.
        let harness = make_harness(
            ExtractBehavior::Yield("from the file".to_string()),
            ClientBehavior::Succeed,
        );
        let request = AnalyzeRequest {
            mode: InputMode::Text,
            text: Some("from the textarea".to_string()),
            file_path: Some("/tmp/also-here.pdf".to_string()),
        };
        let (_, job) = run_request(&harness, request).await;
        assert!(job.result.is_some());
        assert_eq!(harness.extractor_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            harness.client_seen.lock().unwrap().as_deref(),
            Some("from the textarea")
        );

        // File mode with text also present: the extractor output wins.
        let harness = make_harness(
            ExtractBehavior::Yield("from the file".to_string()),
            ClientBehavior::Succeed,
        );
        let request = AnalyzeRequest {
            mode: InputMode::File,
            text: Some("from the textarea".to_string()),
            file_path: Some("/tmp/doc.pdf".to_string()),
        };
        let (_, job) = run_request(&harness, request).await;
        assert!(job.result.is_some());
        assert_eq!(harness.extractor_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            harness.client_seen.lock().unwrap().as_deref(),
            Some("from the file")
        );
    }

    #[tokio::test]
    async fn failure_messages_follow_the_active_language() {
        let harness = make_harness(
            ExtractBehavior::Yield("unused".to_string()),
            ClientBehavior::Succeed,
        );
        harness.locale.set_language(Language::Ar);

        let (_, job) = run_request(&harness, text_request("")).await;

        assert_eq!(job.error.as_deref(), Some("الرجاء إدخال نص للتحليل."));
    }

    #[tokio::test]
    async fn unknown_session_is_an_infrastructure_error() {
        let harness = make_harness(
            ExtractBehavior::Yield("unused".to_string()),
            ClientBehavior::Succeed,
        );
        let err = run_analysis(&harness.runner, &harness.storage, "no-such-session")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::SessionNotFound(_)));
    }
}

//! Interview sessions
//!
//! An [`InterviewService`] owns every live interview. Each session carries
//! the problem, the candidate's code, the transcript, the interviewer's
//! conversation state and the latest mock run. At most one interviewer
//! request is in flight per session; a second one is refused rather than
//! queued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::analyzer::{CodeAnalysis, CodeAnalyzer};
use crate::catalog::{Language, Problem, ProblemCatalog};
use crate::config::ServiceConfig;
use crate::conversation::{ConversationSession, Message, Transcript};
use crate::execution::{ExecutionReport, ExecutionSummary, MockExecutionEngine};
use crate::interviewer::{InterviewContext, Interviewer, START_INTERVIEW};

/// Posted to the transcript when the interviewer misses the reply deadline
pub const CONNECTION_ISSUE: &str =
    "There was an issue connecting to the interview service. Please try again in a moment.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Interview session not found: {0}")]
    NotFound(Uuid),

    #[error("Problem not found: {0}")]
    ProblemNotFound(String),

    #[error("No test cases available for this problem")]
    NoTestCases(String),

    #[error("The interviewer is still answering the previous message")]
    Busy,

    #[error("{0} is reserved, use the start endpoint to begin the interview")]
    ReservedMessage(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Timing knobs for the session layer
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub history_limit: usize,
    pub reply_timeout: Duration,
    pub feedback_debounce: Duration,
    pub processed_reset: Duration,
    /// `None` keeps idle interviews until they are deleted
    pub idle_ttl: Option<Duration>,
}

impl From<&ServiceConfig> for SessionPolicy {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            history_limit: config.conversation.history_limit,
            reply_timeout: config.llm.request_timeout(),
            feedback_debounce: Duration::from_millis(config.conversation.feedback_debounce_ms),
            processed_reset: Duration::from_millis(config.conversation.processed_reset_ms),
            idle_ttl: match config.conversation.idle_ttl_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}

struct InterviewSession {
    id: Uuid,
    problem: Problem,
    language: Language,
    code: String,
    transcript: Transcript,
    conversation: ConversationSession,
    latest_report: Option<ExecutionReport>,
    latest_analysis: Option<CodeAnalysis>,
    status: InterviewStatus,
    status_text: Option<String>,
    created_at: DateTime<Utc>,
}

impl InterviewSession {
    /// Back to a fresh interview on the same problem and code
    fn reset(&mut self) {
        self.transcript.clear();
        self.conversation.reset();
        self.latest_report = None;
        self.latest_analysis = None;
        self.status = InterviewStatus::NotStarted;
        self.status_text = None;
    }

    fn mark_in_progress(&mut self) {
        if self.status == InterviewStatus::NotStarted {
            self.status = InterviewStatus::InProgress;
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            problem_id: self.problem.id.clone(),
            problem_title: self.problem.title.clone(),
            language: self.language.clone(),
            code: self.code.clone(),
            status: self.status,
            status_text: self.status_text.clone(),
            messages: self.transcript.messages().to_vec(),
            latest_report: self.latest_report.clone(),
            latest_analysis: self.latest_analysis.clone(),
            conversation: ConversationInfo {
                has_started: self.conversation.has_started(),
                retry_count: self.conversation.retry_count(),
                history_len: self.conversation.history_len(),
            },
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationInfo {
    pub has_started: bool,
    pub retry_count: u32,
    pub history_len: usize,
}

/// Read-only view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub problem_id: String,
    pub problem_title: String,
    pub language: Language,
    pub code: String,
    pub status: InterviewStatus,
    pub status_text: Option<String>,
    pub messages: Vec<Message>,
    pub latest_report: Option<ExecutionReport>,
    pub latest_analysis: Option<CodeAnalysis>,
    pub conversation: ConversationInfo,
    pub created_at: DateTime<Utc>,
}

/// Result of one "run code" action
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub analysis: CodeAnalysis,
    pub report: ExecutionReport,
}

/// Suppresses follow-up commentary for a result that was already handled,
/// and for any result arriving while the previous one is still "processed".
#[derive(Debug, Default)]
struct FeedbackGate {
    last_fingerprint: Option<String>,
    processed_until: Option<Instant>,
}

impl FeedbackGate {
    fn admit(&mut self, fingerprint: String, now: Instant, hold: Duration) -> bool {
        if self.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return false;
        }
        if self.processed_until.is_some_and(|until| now < until) {
            return false;
        }

        self.last_fingerprint = Some(fingerprint);
        self.processed_until = Some(now + hold);
        true
    }
}

fn fingerprint(summary: &ExecutionSummary) -> String {
    format!(
        "{}:{}/{}",
        summary.timestamp.to_rfc3339(),
        summary.passing,
        summary.total_tests
    )
}

/// Question the candidate "asks" after a run
pub fn follow_up_message(report: &ExecutionReport) -> String {
    let summary = &report.summary;
    if summary.success {
        format!(
            "My solution for the {} problem passed all {} test cases. Is this optimal? Any improvements?",
            report.problem_id, summary.total_tests
        )
    } else {
        format!(
            "My solution for the {} problem passed {} out of {} test cases. What's wrong with my approach?",
            report.problem_id, summary.passing, summary.total_tests
        )
    }
}

/// A scheduled follow-up. Only the debounce wait can be cancelled; once the
/// task has claimed the send slot its request runs to completion.
struct PendingFeedback {
    task: JoinHandle<()>,
    started: Arc<AtomicBool>,
}

impl PendingFeedback {
    fn cancel(self) {
        if !self.started.load(Ordering::Acquire) {
            self.task.abort();
        }
    }
}

struct SessionHandle {
    state: Mutex<InterviewSession>,
    sending: AtomicBool,
    pending_feedback: StdMutex<Option<PendingFeedback>>,
    feedback_gate: StdMutex<FeedbackGate>,
    last_active: StdMutex<Instant>,
}

impl SessionHandle {
    fn new(session: InterviewSession) -> Self {
        Self {
            state: Mutex::new(session),
            sending: AtomicBool::new(false),
            pending_feedback: StdMutex::new(None),
            feedback_gate: StdMutex::new(FeedbackGate::default()),
            last_active: StdMutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self
            .last_active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }

    /// Idle past `ttl` with nothing in flight
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        let last_active = *self
            .last_active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        !self.sending.load(Ordering::Acquire) && now.saturating_duration_since(last_active) >= ttl
    }

    fn try_begin_send(self: &Arc<Self>) -> Option<SendGuard> {
        self.sending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SendGuard {
                handle: Arc::clone(self),
            })
    }

    fn replace_pending(&self, next: Option<PendingFeedback>) {
        let mut pending = self
            .pending_feedback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = pending.take() {
            previous.cancel();
        }
        *pending = next;
    }
}

/// Clears the in-flight flag when dropped
struct SendGuard {
    handle: Arc<SessionHandle>,
}

impl Drop for SendGuard {
    fn drop(&mut self) {
        self.handle.sending.store(false, Ordering::Release);
    }
}

/// Owned copy of what one interviewer turn needs, taken so the session lock
/// is not held while waiting on the provider
struct TurnInput {
    problem: Problem,
    language: Language,
    code: String,
    summary: Option<ExecutionSummary>,
    analysis: Option<CodeAnalysis>,
    conversation: ConversationSession,
}

pub struct InterviewService {
    catalog: Arc<ProblemCatalog>,
    analyzer: Arc<CodeAnalyzer>,
    engine: Arc<MockExecutionEngine>,
    interviewer: Arc<Interviewer>,
    policy: SessionPolicy,
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
}

impl InterviewService {
    pub fn new(
        catalog: Arc<ProblemCatalog>,
        analyzer: Arc<CodeAnalyzer>,
        engine: Arc<MockExecutionEngine>,
        interviewer: Arc<Interviewer>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            catalog,
            analyzer,
            engine,
            interviewer,
            policy,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &ProblemCatalog {
        &self.catalog
    }

    pub fn analyzer(&self) -> &CodeAnalyzer {
        &self.analyzer
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn handle(&self, id: Uuid) -> Result<Arc<SessionHandle>, SessionError> {
        let handle = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))?;
        handle.touch();
        Ok(handle)
    }

    /// Open a new interview on `problem_id` with a fresh conversation
    pub async fn create(
        &self,
        problem_id: &str,
        language: Option<Language>,
    ) -> Result<SessionSnapshot, SessionError> {
        let problem = self
            .catalog
            .get(problem_id)
            .cloned()
            .ok_or_else(|| SessionError::ProblemNotFound(problem_id.to_string()))?;

        let language = language.unwrap_or_default();
        let session = InterviewSession {
            id: Uuid::new_v4(),
            code: problem.starter_code_for(&language).to_string(),
            problem,
            language,
            transcript: Transcript::new(),
            conversation: ConversationSession::new(self.policy.history_limit),
            latest_report: None,
            latest_analysis: None,
            status: InterviewStatus::NotStarted,
            status_text: None,
            created_at: Utc::now(),
        };

        let snapshot = session.snapshot();
        let handle = Arc::new(SessionHandle::new(session));

        self.sessions.write().await.insert(snapshot.id, handle);
        tracing::info!(session_id = %snapshot.id, problem_id = %snapshot.problem_id, "interview created");

        Ok(snapshot)
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let handle = self.handle(id).await?;
        let session = handle.state.lock().await;
        Ok(session.snapshot())
    }

    /// Replace the code and/or switch language. Switching language without
    /// new code loads that language's starter code.
    pub async fn update_code(
        &self,
        id: Uuid,
        code: Option<String>,
        language: Option<Language>,
    ) -> Result<SessionSnapshot, SessionError> {
        let handle = self.handle(id).await?;
        let mut session = handle.state.lock().await;

        if let Some(language) = language {
            if language != session.language {
                session.code = session.problem.starter_code_for(&language).to_string();
                session.language = language;
            }
        }
        if let Some(code) = code {
            session.code = code;
        }

        Ok(session.snapshot())
    }

    /// Ask for the opening greeting. `None` means the interview was already
    /// greeted and nothing was posted.
    pub async fn start(&self, id: Uuid) -> Result<Option<Message>, SessionError> {
        let handle = self.handle(id).await?;
        let _guard = handle.try_begin_send().ok_or(SessionError::Busy)?;
        Ok(self.converse(&handle, START_INTERVIEW).await)
    }

    /// Start over on the same problem and code. Any scheduled follow-up is
    /// cancelled; refused while the interviewer is answering.
    pub async fn restart(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let handle = self.handle(id).await?;
        let _guard = handle.try_begin_send().ok_or(SessionError::Busy)?;

        handle.replace_pending(None);
        *handle
            .feedback_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = FeedbackGate::default();

        let mut session = handle.state.lock().await;
        session.reset();
        tracing::info!(session_id = %id, "interview restarted");
        Ok(session.snapshot())
    }

    /// Post a candidate message and wait for the interviewer's answer
    pub async fn send_message(&self, id: Uuid, text: &str) -> Result<Option<Message>, SessionError> {
        if text.trim() == START_INTERVIEW {
            return Err(SessionError::ReservedMessage(START_INTERVIEW));
        }
        let handle = self.handle(id).await?;
        let _guard = handle.try_begin_send().ok_or(SessionError::Busy)?;

        handle.state.lock().await.transcript.push(Message::user(text));
        Ok(self.converse(&handle, text).await)
    }

    /// Analyze the current code, simulate a run, and schedule follow-up
    /// commentary on the result.
    pub async fn run_code(self: &Arc<Self>, id: Uuid) -> Result<RunOutcome, SessionError> {
        let handle = self.handle(id).await?;

        let (problem, language, code) = {
            let mut session = handle.state.lock().await;
            if session.problem.test_cases.is_empty() {
                return Err(SessionError::NoTestCases(session.problem.id.clone()));
            }
            session.mark_in_progress();
            session.status_text = Some("Running tests...".to_string());
            (session.problem.clone(), session.language.clone(), session.code.clone())
        };

        let analysis = self.analyzer.analyze(&code, &problem.id, &language);
        let report = self.engine.simulate(&code, &language, &problem, &analysis).await;

        {
            let mut session = handle.state.lock().await;
            session.status_text = Some(if report.summary.is_empty {
                "No solution to run".to_string()
            } else {
                format!(
                    "{} of {} tests passing",
                    report.summary.passing, report.summary.total_tests
                )
            });
            session.latest_report = Some(report.clone());
            session.latest_analysis = Some(analysis.clone());
        }

        self.schedule_feedback(&handle, &report.summary);

        Ok(RunOutcome { analysis, report })
    }

    pub async fn complete(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let handle = self.handle(id).await?;
        let mut session = handle.state.lock().await;
        session.status = InterviewStatus::Completed;
        tracing::info!(session_id = %id, "interview completed");
        Ok(session.snapshot())
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(SessionError::NotFound(id))?;
        handle.replace_pending(None);
        tracing::info!(session_id = %id, "interview removed");
        Ok(())
    }

    /// Drop interviews idle past the TTL. Returns how many were removed.
    pub async fn sweep_idle(&self) -> usize {
        let Some(ttl) = self.policy.idle_ttl else {
            return 0;
        };

        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, handle| {
            if handle.is_expired(now, ttl) {
                handle.replace_pending(None);
                tracing::info!(session_id = %id, "idle interview dropped");
                false
            } else {
                true
            }
        });
        before - sessions.len()
    }

    /// Run [`Self::sweep_idle`] periodically until the service is dropped.
    /// Nothing is spawned when the TTL is disabled.
    pub fn spawn_idle_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let ttl = self.policy.idle_ttl?;
        let period = ttl.min(Duration::from_secs(60));
        let service: Weak<Self> = Arc::downgrade(self);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(service) = service.upgrade() else {
                    break;
                };
                let removed = service.sweep_idle().await;
                if removed > 0 {
                    tracing::debug!(removed, "idle sweep finished");
                }
            }
        }))
    }

    fn schedule_feedback(self: &Arc<Self>, handle: &Arc<SessionHandle>, summary: &ExecutionSummary) {
        let hold = self.policy.feedback_debounce + self.policy.processed_reset;
        let admitted = handle
            .feedback_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .admit(fingerprint(summary), Instant::now(), hold);

        if !admitted {
            tracing::debug!("test result already being processed, no follow-up scheduled");
            return;
        }

        let service = Arc::clone(self);
        let target = Arc::clone(handle);
        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);
        let task = tokio::spawn(async move {
            tokio::time::sleep(service.policy.feedback_debounce).await;
            service.deliver_feedback(&target, &flag).await;
        });
        handle.replace_pending(Some(PendingFeedback { task, started }));
    }

    async fn deliver_feedback(&self, handle: &Arc<SessionHandle>, started: &AtomicBool) {
        let Some(_guard) = handle.try_begin_send() else {
            tracing::debug!("interviewer busy, dropping follow-up");
            return;
        };
        started.store(true, Ordering::Release);

        let message = {
            let session = handle.state.lock().await;
            match &session.latest_report {
                Some(report) => follow_up_message(report),
                None => return,
            }
        };

        self.converse(handle, &message).await;
    }

    /// One interviewer turn. Whatever gets posted (reply or connection
    /// notice) is appended to the transcript and returned.
    async fn converse(&self, handle: &SessionHandle, last_message: &str) -> Option<Message> {
        let mut turn = {
            let mut session = handle.state.lock().await;
            session.mark_in_progress();
            TurnInput {
                problem: session.problem.clone(),
                language: session.language.clone(),
                code: session.code.clone(),
                summary: session.latest_report.as_ref().map(|r| r.summary.clone()),
                analysis: session.latest_analysis.clone(),
                conversation: session.conversation.clone(),
            }
        };

        let context = InterviewContext {
            problem: &turn.problem,
            language: &turn.language,
            code: &turn.code,
            last_message,
            test_results: turn.summary.as_ref(),
            analysis: turn.analysis.as_ref(),
        };

        let outcome = tokio::time::timeout(
            self.policy.reply_timeout,
            self.interviewer.reply(&mut turn.conversation, &context),
        )
        .await;

        let posted = match outcome {
            Ok(reply) => reply.map(Message::assistant),
            Err(_) => {
                turn.conversation.record_failure();
                tracing::warn!(
                    timeout_secs = self.policy.reply_timeout.as_secs(),
                    "interviewer reply timed out"
                );
                Some(Message::system(CONNECTION_ISSUE))
            }
        };

        let mut session = handle.state.lock().await;
        session.conversation = turn.conversation;
        if let Some(message) = &posted {
            session.transcript.push(message.clone());
        }
        posted
    }
}

//! Header size classification.
//!
//! Two strategies produce candidate header sizes from a [`FontProfile`]:
//!
//! - **Oracle**: an external model reads the font report and proposes
//!   sizes. Its reply is validated against the profile: values with no
//!   matching size in the profile are dropped, values at or below the body
//!   size are dropped. Timeouts, errors, unparsable replies, cancellation,
//!   and replies that validate to nothing all fall back to the heuristic.
//! - **Heuristic**: every size above the body, see [`heuristic_sizes`].
//!
//! Whatever the strategy, the final set is filtered once more to sizes
//! strictly above the body before it is returned.

pub mod heuristic;

use std::future::Future;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

pub use heuristic::heuristic_sizes;

use crate::oracle::{OracleError, OracleReply, OracleRequest, SizeOracle};
use crate::profile::{FontProfile, SizeKey};

/// Default matching tolerance between a line size and a header size.
pub const DEFAULT_SIZE_TOLERANCE: f32 = 0.2;

/// Font sizes judged to mark section titles, in rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSizeSet {
    sizes: Vec<SizeKey>,
}

impl HeaderSizeSet {
    /// Build from keys in rank order. Duplicates keep their first rank.
    pub fn from_keys(keys: impl IntoIterator<Item = SizeKey>) -> Self {
        let mut sizes: Vec<SizeKey> = Vec::new();
        for key in keys {
            if !sizes.contains(&key) {
                sizes.push(key);
            }
        }
        Self { sizes }
    }

    pub fn from_points(points: &[f32]) -> Self {
        Self::from_keys(points.iter().map(|p| SizeKey::from_points(*p)))
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn points(&self) -> Vec<f32> {
        self.sizes.iter().map(|k| k.points()).collect()
    }

    /// `true` when some member is within `tolerance` of `size`.
    pub fn matches(&self, size: SizeKey, tolerance: f32) -> bool {
        self.sizes.iter().any(|h| h.within(size, tolerance))
    }

    /// Drop every member `<= body_size`, returning the discarded ones.
    pub fn retain_above(&mut self, body_size: f32) -> Vec<SizeKey> {
        let body = SizeKey::from_points(body_size);
        let (kept, discarded): (Vec<SizeKey>, Vec<SizeKey>) =
            std::mem::take(&mut self.sizes).into_iter().partition(|k| *k > body);
        self.sizes = kept;
        discarded
    }
}

impl Serialize for HeaderSizeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.points().serialize(serializer)
    }
}

/// Outcome of checking oracle sizes against the profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub accepted: HeaderSizeSet,
    /// Values with no size in the profile within tolerance.
    pub out_of_domain: Vec<f32>,
    /// Values that exist but are not larger than the body.
    pub not_above_body: Vec<f32>,
}

/// Check candidate sizes against the profile's own size domain and body
/// size. Accepted values are replaced by the profile key they matched.
pub fn validate_sizes(
    candidates: &[f32],
    profile: &FontProfile,
    body_size: f32,
    tolerance: f32,
) -> Validation {
    let body = SizeKey::from_points(body_size);
    let mut accepted = Vec::new();
    let mut validation = Validation::default();

    for &candidate in candidates {
        match profile.nearest_key(candidate, tolerance) {
            None => validation.out_of_domain.push(candidate),
            Some(key) if key <= body => validation.not_above_body.push(candidate),
            Some(key) => accepted.push(key),
        }
    }

    validation.accepted = HeaderSizeSet::from_keys(accepted);
    validation
}

/// Which strategy produced the final set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecidedBy {
    Heuristic,
    Oracle,
}

/// Final header sizes and how they were reached.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub sizes: HeaderSizeSet,
    pub body_size: f32,
    pub decided_by: DecidedBy,
    /// Oracle backend consulted, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle: Option<String>,
    /// Oracle rationale, when the oracle decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Why the oracle was not used, when it was configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// Classifier settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Per-attempt deadline for one oracle round trip.
    pub timeout: Duration,
    /// Extra attempts after the first failed one.
    pub retries: u32,
    pub size_tolerance: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            retries: 1,
            size_tolerance: DEFAULT_SIZE_TOLERANCE,
        }
    }
}

/// Classification strategy selection.
pub enum Strategy {
    /// Rule-based only
    Heuristic,
    /// Oracle first, heuristic on any failure
    Oracle(Box<dyn SizeOracle>),
}

/// Produces the validated [`HeaderSizeSet`] for a profile.
pub struct HeaderClassifier {
    strategy: Strategy,
    config: ClassifierConfig,
}

impl HeaderClassifier {
    pub fn new(strategy: Strategy, config: ClassifierConfig) -> Self {
        Self { strategy, config }
    }

    pub fn heuristic() -> Self {
        Self::new(Strategy::Heuristic, ClassifierConfig::default())
    }

    pub fn with_oracle(oracle: Box<dyn SizeOracle>, config: ClassifierConfig) -> Self {
        Self::new(Strategy::Oracle(oracle), config)
    }

    /// Classify without external cancellation.
    pub async fn classify(&self, profile: &FontProfile, body_size: f32) -> Classification {
        self.classify_until(profile, body_size, std::future::pending()).await
    }

    /// Classify, abandoning the oracle round trip as soon as `cancel`
    /// completes. Never fails: every oracle problem ends in the heuristic.
    pub async fn classify_until<F>(&self, profile: &FontProfile, body_size: f32, cancel: F) -> Classification
    where
        F: Future<Output = ()>,
    {
        let mut classification = match &self.strategy {
            Strategy::Heuristic => self.fallback(profile, body_size, None, None),
            Strategy::Oracle(oracle) => {
                let request = OracleRequest::new(profile, body_size);
                let outcome = tokio::select! {
                    outcome = self.consult(oracle.as_ref(), &request) => Some(outcome),
                    () = cancel => None,
                };
                self.decide(profile, body_size, oracle.name(), outcome)
            }
        };

        let discarded = classification.sizes.retain_above(body_size);
        if !discarded.is_empty() {
            warn!("Discarded header sizes not above body {body_size:.1}: {discarded:?}");
        }

        info!(
            "Header sizes {:?} (body {:.1}, by {:?})",
            classification.sizes.points(),
            body_size,
            classification.decided_by
        );
        classification
    }

    fn decide(
        &self,
        profile: &FontProfile,
        body_size: f32,
        oracle_name: &str,
        outcome: Option<Result<OracleReply, OracleError>>,
    ) -> Classification {
        let name = Some(oracle_name.to_string());
        let reply = match outcome {
            None => {
                warn!("Oracle {oracle_name} cancelled, using heuristic");
                return self.fallback(profile, body_size, name, Some("cancelled".to_string()));
            }
            Some(Err(e)) => {
                warn!("Oracle {oracle_name} failed ({e}), using heuristic");
                return self.fallback(profile, body_size, name, Some(e.to_string()));
            }
            Some(Ok(reply)) => reply,
        };

        debug!("Oracle reasoning: {}", reply.reasoning);
        let validation = validate_sizes(&reply.sizes, profile, body_size, self.config.size_tolerance);
        if !validation.out_of_domain.is_empty() {
            warn!("Oracle proposed sizes absent from the document: {:?}", validation.out_of_domain);
        }
        if !validation.not_above_body.is_empty() {
            warn!("Oracle proposed sizes not above body: {:?}", validation.not_above_body);
        }
        if reply.dropped > 0 {
            warn!("Oracle reply had {} non-numeric entries", reply.dropped);
        }

        if validation.accepted.is_empty() {
            warn!("Oracle {oracle_name} proposed no usable sizes, using heuristic");
            return self.fallback(
                profile,
                body_size,
                name,
                Some("no valid sizes in oracle reply".to_string()),
            );
        }

        Classification {
            sizes: validation.accepted,
            body_size,
            decided_by: DecidedBy::Oracle,
            oracle: name,
            reasoning: Some(reply.reasoning),
            fallback_reason: None,
        }
    }

    fn fallback(
        &self,
        profile: &FontProfile,
        body_size: f32,
        oracle: Option<String>,
        fallback_reason: Option<String>,
    ) -> Classification {
        Classification {
            sizes: heuristic_sizes(profile, body_size),
            body_size,
            decided_by: DecidedBy::Heuristic,
            oracle,
            reasoning: None,
            fallback_reason,
        }
    }

    /// Bounded retries, each under the configured timeout.
    async fn consult(&self, oracle: &dyn SizeOracle, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        let attempts = self.config.retries + 1;
        let mut last_error = OracleError::Unavailable("no attempt made".to_string());

        for attempt in 1..=attempts {
            match tokio::time::timeout(self.config.timeout, oracle.propose(request)).await {
                Ok(Ok(reply)) => return Ok(reply),
                Ok(Err(e)) => {
                    warn!("Oracle attempt {attempt}/{attempts} failed: {e}");
                    last_error = e;
                }
                Err(_) => {
                    warn!("Oracle attempt {attempt}/{attempts} timed out");
                    last_error = OracleError::Timeout(self.config.timeout);
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::layout::{Line, Word};

    fn line(size: f32) -> Line {
        Line {
            words: vec![Word::new("t", size, 100.0)],
            text: "t".to_string(),
            size,
            top: 100.0,
            page_height: 800.0,
            page: 0,
        }
    }

    /// Body 12 (x4), plus 10, 14, 18 present once or twice.
    fn profile() -> FontProfile {
        let sizes = [12.0, 12.0, 12.0, 12.0, 10.0, 14.0, 14.0, 18.0];
        let lines: Vec<Line> = sizes.iter().map(|s| line(*s)).collect();
        FontProfile::from_lines(&lines, 3, 100)
    }

    enum Script {
        Reply(Vec<f32>),
        Fail,
        Hang,
    }

    struct ScriptedOracle {
        script: Vec<Script>,
        calls: Arc<AtomicU32>,
    }

    impl ScriptedOracle {
        fn boxed(script: Vec<Script>) -> (Box<dyn SizeOracle>, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            let oracle = Self {
                script,
                calls: Arc::clone(&calls),
            };
            (Box::new(oracle), calls)
        }
    }

    #[async_trait]
    impl SizeOracle for ScriptedOracle {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn propose(&self, _request: &OracleRequest) -> Result<OracleReply, OracleError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            match self.script.get(call) {
                Some(Script::Reply(sizes)) => Ok(OracleReply {
                    sizes: sizes.clone(),
                    dropped: 0,
                    reasoning: "numbered titles".to_string(),
                }),
                Some(Script::Hang) => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(OracleError::Unavailable("unreachable".to_string()))
                }
                Some(Script::Fail) | None => Err(OracleError::Malformed("garbage".to_string())),
            }
        }
    }

    fn quick_config() -> ClassifierConfig {
        ClassifierConfig {
            timeout: Duration::from_millis(50),
            retries: 1,
            size_tolerance: DEFAULT_SIZE_TOLERANCE,
        }
    }

    #[test]
    fn validation_drops_below_body_and_hallucinated() {
        let validation = validate_sizes(&[10.0, 14.0, 18.0, 999.0], &profile(), 12.0, 0.2);
        assert_eq!(validation.accepted.points(), vec![14.0, 18.0]);
        assert_eq!(validation.out_of_domain, vec![999.0]);
        assert_eq!(validation.not_above_body, vec![10.0]);
    }

    #[test]
    fn validation_snaps_to_profile_key() {
        let validation = validate_sizes(&[14.1, 17.9], &profile(), 12.0, 0.2);
        assert_eq!(validation.accepted.points(), vec![14.0, 18.0]);
    }

    #[test]
    fn header_set_matches_with_tolerance() {
        let set = HeaderSizeSet::from_points(&[24.0]);
        assert!(set.matches(SizeKey::from_points(24.1), 0.2));
        assert!(!set.matches(SizeKey::from_points(24.2), 0.2));
    }

    #[test]
    fn retain_above_discards_body_and_smaller() {
        let mut set = HeaderSizeSet::from_points(&[18.0, 12.0, 10.0, 14.0]);
        let discarded = set.retain_above(12.0);
        assert_eq!(set.points(), vec![18.0, 14.0]);
        assert_eq!(discarded.len(), 2);
    }

    #[test]
    fn header_set_serializes_as_points() {
        let set = HeaderSizeSet::from_points(&[18.0, 14.5]);
        assert_eq!(serde_json::to_string(&set).unwrap(), "[18.0,14.5]");
    }

    #[tokio::test]
    async fn heuristic_strategy() {
        let classification = HeaderClassifier::heuristic().classify(&profile(), 12.0).await;
        assert_eq!(classification.decided_by, DecidedBy::Heuristic);
        assert_eq!(classification.sizes.points(), vec![18.0, 14.0]);
        assert!(classification.fallback_reason.is_none());
    }

    #[tokio::test]
    async fn oracle_reply_is_validated() {
        let (oracle, _) = ScriptedOracle::boxed(vec![Script::Reply(vec![10.0, 14.0, 18.0, 999.0])]);
        let classifier = HeaderClassifier::with_oracle(oracle, quick_config());

        let classification = classifier.classify(&profile(), 12.0).await;
        assert_eq!(classification.decided_by, DecidedBy::Oracle);
        assert_eq!(classification.sizes.points(), vec![14.0, 18.0]);
        assert_eq!(classification.reasoning.as_deref(), Some("numbered titles"));
    }

    #[tokio::test]
    async fn oracle_failure_retries_once_then_succeeds() {
        let (oracle, calls) = ScriptedOracle::boxed(vec![Script::Fail, Script::Reply(vec![18.0])]);
        let classifier = HeaderClassifier::with_oracle(oracle, quick_config());

        let classification = classifier.classify(&profile(), 12.0).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(classification.decided_by, DecidedBy::Oracle);
        assert_eq!(classification.sizes.points(), vec![18.0]);
    }

    #[tokio::test]
    async fn oracle_exhausted_falls_back() {
        let (oracle, calls) = ScriptedOracle::boxed(vec![Script::Fail, Script::Fail, Script::Reply(vec![18.0])]);
        let classifier = HeaderClassifier::with_oracle(oracle, quick_config());

        let classification = classifier.classify(&profile(), 12.0).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(classification.decided_by, DecidedBy::Heuristic);
        assert_eq!(classification.oracle.as_deref(), Some("scripted"));
        assert!(classification.fallback_reason.is_some());
        assert_eq!(classification.sizes.points(), vec![18.0, 14.0]);
    }

    #[tokio::test]
    async fn oracle_timeout_falls_back() {
        let (oracle, calls) = ScriptedOracle::boxed(vec![Script::Hang, Script::Hang]);
        let classifier = HeaderClassifier::with_oracle(oracle, quick_config());

        let classification = classifier.classify(&profile(), 12.0).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(classification.decided_by, DecidedBy::Heuristic);
        assert!(classification.fallback_reason.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn cancellation_falls_back() {
        let (oracle, _) = ScriptedOracle::boxed(vec![Script::Hang]);
        let config = ClassifierConfig {
            timeout: Duration::from_secs(30),
            ..quick_config()
        };
        let classifier = HeaderClassifier::with_oracle(oracle, config);

        let cancel = tokio::time::sleep(Duration::from_millis(20));
        let classification = classifier.classify_until(&profile(), 12.0, cancel).await;
        assert_eq!(classification.decided_by, DecidedBy::Heuristic);
        assert_eq!(classification.fallback_reason.as_deref(), Some("cancelled"));
    }

    #[tokio::test]
    async fn oracle_reply_without_valid_sizes_falls_back() {
        let (oracle, _) = ScriptedOracle::boxed(vec![Script::Reply(vec![10.0, 12.0, 999.0])]);
        let classifier = HeaderClassifier::with_oracle(oracle, quick_config());

        let classification = classifier.classify(&profile(), 12.0).await;
        assert_eq!(classification.decided_by, DecidedBy::Heuristic);
        assert_eq!(classification.sizes.points(), vec![18.0, 14.0]);
    }

    #[tokio::test]
    async fn empty_profile_yields_no_sizes() {
        let profile = FontProfile::default();
        let classification = HeaderClassifier::heuristic()
            .classify(&profile, profile.body_size())
            .await;
        assert!(classification.sizes.is_empty());
    }

    /// Keeps the last request it was asked about.
    struct RecordingOracle {
        seen: Arc<std::sync::Mutex<Option<OracleRequest>>>,
    }

    #[async_trait]
    impl SizeOracle for RecordingOracle {
        fn name(&self) -> &str {
            "recording"
        }

        async fn propose(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok(OracleReply {
                sizes: vec![18.0],
                dropped: 0,
                reasoning: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn oracle_sees_profile_report_and_body_size() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let oracle = RecordingOracle { seen: Arc::clone(&seen) };
        let classifier = HeaderClassifier::with_oracle(Box::new(oracle), quick_config());
        let profile = profile();

        classifier.classify(&profile, 12.0).await;
        let request = seen.lock().unwrap().clone().unwrap();
        assert_eq!(request.body_size, 12.0);
        assert_eq!(request.report, profile.render_report());
        assert!(request.report.contains("DETECTED BODY TEXT SIZE"));
    }
}

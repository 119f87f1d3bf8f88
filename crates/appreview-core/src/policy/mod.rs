//! Review prompt policy.
//!
//! [`ReviewPolicy`] counts launches, remembers when the user was last asked,
//! and decides on each foreground event whether to ask again:
//!
//! ```text
//! launch_count >= min_launches
//! AND days_between(first_launch_at, now) >= min_days_since_first_launch
//! AND (never prompted OR days_between(last_review_prompt_at, now) >= cooldown_days)
//! AND last_review_prompt_version != current_app_version
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use appreview_core::{MemoryStore, PolicyConfig, PromptRequest, Prompter, ReviewPolicy, ReviewTrigger, SurfaceId};
//!
//! struct NativeReview;
//!
//! impl ReviewTrigger for NativeReview {
//!     fn request_review(&self, _surface: Option<SurfaceId>) {}
//! }
//!
//! let config = PolicyConfig::new("1.0").unwrap().with_min_launches(3);
//! let policy = ReviewPolicy::new(config, Arc::new(MemoryStore::new()), Prompter::new(Arc::new(NativeReview)));
//!
//! assert!(!policy.evaluate_and_maybe_prompt(&PromptRequest::direct()).unwrap());
//! assert!(!policy.evaluate_and_maybe_prompt(&PromptRequest::direct()).unwrap());
//! assert!(policy.evaluate_and_maybe_prompt(&PromptRequest::direct()).unwrap());
//! ```

mod clock;

pub use clock::{days_between, Clock, ManualClock, SystemClock};

use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ReviewConfig;
use crate::error::ReviewResult;
use crate::prompt::{ConfirmationPresenter, PromptRequest, Prompter, ReviewTrigger};
use crate::store::{KeyValueStore, SqliteStore, StateKey, StoredValue, DEFAULT_NAMESPACE};
use crate::version::{resolve_version, AppVersionProvider, StaticVersion};

/// Days that must pass after a prompt before the next one.
pub const DEFAULT_COOLDOWN_DAYS: u32 = 125;

/// Thresholds the policy checks against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    min_launches: u32,
    min_days_since_first_launch: u32,
    cooldown_days: u32,
    current_app_version: String,
}

impl PolicyConfig {
    /// Config with no launch/day thresholds and the default cooldown.
    ///
    /// Fails if `app_version` is blank.
    pub fn new(app_version: impl Into<String>) -> ReviewResult<Self> {
        Self::resolve(&StaticVersion::new(app_version))
    }

    /// Config whose version comes from the host's provider.
    pub fn resolve(provider: &dyn AppVersionProvider) -> ReviewResult<Self> {
        Ok(Self {
            min_launches: 0,
            min_days_since_first_launch: 0,
            cooldown_days: DEFAULT_COOLDOWN_DAYS,
            current_app_version: resolve_version(provider)?,
        })
    }

    /// Minimum cumulative launches, inclusive.
    pub fn min_launches(&self) -> u32 {
        self.min_launches
    }

    /// Minimum calendar days since the first launch, inclusive.
    pub fn min_days_since_first_launch(&self) -> u32 {
        self.min_days_since_first_launch
    }

    /// Minimum calendar days since the last prompt, inclusive.
    pub fn cooldown_days(&self) -> u32 {
        self.cooldown_days
    }

    /// Version of the running build, compared as an opaque string.
    pub fn current_app_version(&self) -> &str {
        &self.current_app_version
    }

    /// Builder method to set minimum launches
    pub fn with_min_launches(mut self, launches: u32) -> Self {
        self.min_launches = launches;
        self
    }

    /// Builder method to set minimum days since first launch
    pub fn with_min_days_since_first_launch(mut self, days: u32) -> Self {
        self.min_days_since_first_launch = days;
        self
    }

    /// Builder method to set the cooldown
    pub fn with_cooldown_days(mut self, days: u32) -> Self {
        self.cooldown_days = days;
        self
    }
}

/// Snapshot of the persisted review state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub launch_count: u64,
    pub first_launch_at: Option<DateTime<FixedOffset>>,
    pub last_review_prompt_at: Option<DateTime<FixedOffset>>,
    pub last_review_prompt_version: Option<String>,
}

/// Outcome of each eligibility clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    pub launches_met: bool,
    pub days_since_first_launch_met: bool,
    pub cooldown_met: bool,
    pub version_met: bool,
}

impl Eligibility {
    /// Evaluate every clause against `state` at `now`.
    pub fn evaluate(state: &PersistedState, config: &PolicyConfig, now: DateTime<FixedOffset>) -> Self {
        let days_since_first = state
            .first_launch_at
            .map_or(0, |first| days_between(first, now));

        Self {
            launches_met: state.launch_count >= u64::from(config.min_launches),
            days_since_first_launch_met: days_since_first >= i64::from(config.min_days_since_first_launch),
            cooldown_met: state
                .last_review_prompt_at
                .map_or(true, |last| days_between(last, now) >= i64::from(config.cooldown_days)),
            version_met: state.last_review_prompt_version.as_deref()
                != Some(config.current_app_version.as_str()),
        }
    }

    /// All clauses hold.
    pub fn is_eligible(&self) -> bool {
        self.launches_met && self.days_since_first_launch_met && self.cooldown_met && self.version_met
    }
}

/// Decides when to ask for a review and fires the prompt.
pub struct ReviewPolicy {
    config: PolicyConfig,
    store: Arc<dyn KeyValueStore>,
    prompter: Prompter,
    clock: Arc<dyn Clock>,
    namespace: String,
}

impl ReviewPolicy {
    /// Create a policy over `store` using the system clock.
    pub fn new(config: PolicyConfig, store: Arc<dyn KeyValueStore>, prompter: Prompter) -> Self {
        Self {
            config,
            store,
            prompter,
            clock: Arc::new(SystemClock),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Build a policy from a [`ReviewConfig`], opening the SQLite state
    /// database and resolving the trigger among `triggers`.
    ///
    /// Fails if the app version cannot be resolved or the database cannot be
    /// opened.
    pub fn from_config(
        config: &ReviewConfig,
        versions: &dyn AppVersionProvider,
        triggers: Vec<Arc<dyn ReviewTrigger>>,
        presenter: Option<Arc<dyn ConfirmationPresenter>>,
    ) -> ReviewResult<Self> {
        let policy_config = config.policy_config(versions)?;
        let store = SqliteStore::new(&config.state_db_path)?;

        let mut prompter = Prompter::resolve(triggers).with_settings(config.prompt_settings());
        if let Some(presenter) = presenter {
            prompter = prompter.with_presenter(presenter);
        }

        info!(
            version = %policy_config.current_app_version,
            db = %config.state_db_path.display(),
            "Review policy initialized"
        );

        Ok(Self::new(policy_config, Arc::new(store), prompter).with_namespace(config.namespace.clone()))
    }

    /// Builder method to set the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder method to set the storage key namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn prompter(&self) -> &Prompter {
        &self.prompter
    }

    fn key(&self, key: StateKey) -> String {
        key.storage_key(&self.namespace)
    }

    /// Record a launch and prompt if the user is eligible.
    ///
    /// The launch is always recorded, even when no prompt follows. On a
    /// prompt, the prompt time and version are stored before the request is
    /// fired, since the platform never reports what the user did.
    pub fn evaluate_and_maybe_prompt(&self, request: &PromptRequest) -> ReviewResult<bool> {
        let now = self.clock.now();

        let first_key = self.key(StateKey::FirstLaunchAt);
        if self.store.get_timestamp(&first_key)?.is_none() {
            self.store.set_timestamp(&first_key, now)?;
        }

        let count_key = self.key(StateKey::LaunchCount);
        let launches = self.store.get_int(&count_key)?.unwrap_or(0).max(0).saturating_add(1);
        self.store.set_int(&count_key, launches)?;

        let state = self.state()?;
        let eligibility = Eligibility::evaluate(&state, &self.config, now);
        debug!(
            launches = state.launch_count,
            launches_met = eligibility.launches_met,
            days_met = eligibility.days_since_first_launch_met,
            cooldown_met = eligibility.cooldown_met,
            version_met = eligibility.version_met,
            "Evaluated review eligibility"
        );

        if !eligibility.is_eligible() {
            return Ok(false);
        }

        self.store.set_many(vec![
            (self.key(StateKey::LastReviewPromptAt), StoredValue::Timestamp(now)),
            (
                self.key(StateKey::LastReviewPromptVersion),
                StoredValue::Text(self.config.current_app_version.clone()),
            ),
        ])?;

        info!(
            version = %self.config.current_app_version,
            launches = state.launch_count,
            request = request.kind(),
            "Requesting app review"
        );
        self.prompter.fire(request);
        Ok(true)
    }

    /// Fire `request` now, ignoring eligibility and leaving state untouched.
    pub fn request_immediately(&self, request: &PromptRequest) {
        debug!(request = request.kind(), "Requesting app review immediately");
        self.prompter.fire(request);
    }

    /// Current persisted state.
    pub fn state(&self) -> ReviewResult<PersistedState> {
        Ok(PersistedState {
            launch_count: self
                .store
                .get_int(&self.key(StateKey::LaunchCount))?
                .map_or(0, |n| n.max(0) as u64),
            first_launch_at: self.store.get_timestamp(&self.key(StateKey::FirstLaunchAt))?,
            last_review_prompt_at: self
                .store
                .get_timestamp(&self.key(StateKey::LastReviewPromptAt))?,
            last_review_prompt_version: self
                .store
                .get_string(&self.key(StateKey::LastReviewPromptVersion))?,
        })
    }

    /// Eligibility right now, without recording a launch.
    pub fn eligibility(&self) -> ReviewResult<Eligibility> {
        let state = self.state()?;
        Ok(Eligibility::evaluate(&state, &self.config, self.clock.now()))
    }

    /// Calendar days since the first launch, 0 before any launch.
    pub fn days_since_first_launch(&self) -> ReviewResult<i64> {
        let first = self.store.get_timestamp(&self.key(StateKey::FirstLaunchAt))?;
        Ok(first.map_or(0, |at| days_between(at, self.clock.now())))
    }

    /// Calendar days since the last prompt, 0 if never prompted.
    pub fn days_since_last_prompt(&self) -> ReviewResult<i64> {
        let last = self.store.get_timestamp(&self.key(StateKey::LastReviewPromptAt))?;
        Ok(last.map_or(0, |at| days_between(at, self.clock.now())))
    }

    /// Forget all persisted review state.
    pub fn reset(&self) -> ReviewResult<()> {
        for key in StateKey::all() {
            self.store.remove(&self.key(key))?;
        }
        info!(namespace = %self.namespace, "Review state reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{ConfirmationPresenter, MockReviewTrigger, PromptCallback, PromptCopy, SurfaceId};
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTrigger {
        calls: AtomicUsize,
    }

    impl ReviewTrigger for CountingTrigger {
        fn request_review(&self, _surface: Option<SurfaceId>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        policy: ReviewPolicy,
        clock: Arc<ManualClock>,
        trigger: Arc<CountingTrigger>,
        store: Arc<MemoryStore>,
    }

    fn start() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 10, 0, 0)
            .unwrap()
    }

    fn fixture(config: PolicyConfig) -> Fixture {
        let clock = Arc::new(ManualClock::new(start()));
        let trigger = Arc::new(CountingTrigger::default());
        let store = Arc::new(MemoryStore::new());
        let prompter = Prompter::new(trigger.clone()).with_delay(std::time::Duration::ZERO);
        let policy = ReviewPolicy::new(config, store.clone(), prompter).with_clock(clock.clone());
        Fixture {
            policy,
            clock,
            trigger,
            store,
        }
    }

    fn evaluate(policy: &ReviewPolicy) -> bool {
        policy.evaluate_and_maybe_prompt(&PromptRequest::direct()).unwrap()
    }

    #[test]
    fn test_launch_count_increments_every_call() {
        let f = fixture(PolicyConfig::new("1.0").unwrap().with_min_launches(100));

        for n in 1..=5u64 {
            assert!(!evaluate(&f.policy));
            assert_eq!(f.policy.state().unwrap().launch_count, n);
        }
    }

    #[test]
    fn test_first_launch_is_never_overwritten() {
        let f = fixture(PolicyConfig::new("1.0").unwrap().with_min_launches(100));

        evaluate(&f.policy);
        f.clock.advance(Duration::days(40));
        evaluate(&f.policy);

        assert_eq!(f.policy.state().unwrap().first_launch_at, Some(start()));
        assert_eq!(f.policy.days_since_first_launch().unwrap(), 40);
    }

    #[test]
    fn test_min_launches_boundary_is_inclusive() {
        let f = fixture(PolicyConfig::new("1.0").unwrap().with_min_launches(3));

        assert!(!evaluate(&f.policy));
        assert!(!evaluate(&f.policy));
        assert!(evaluate(&f.policy));
        assert_eq!(f.trigger.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_min_days_since_first_launch() {
        let f = fixture(PolicyConfig::new("1.0").unwrap().with_min_days_since_first_launch(2));

        assert!(!evaluate(&f.policy));
        f.clock.advance(Duration::days(1));
        assert!(!evaluate(&f.policy));
        f.clock.advance(Duration::days(1));
        assert!(evaluate(&f.policy));
    }

    #[test]
    fn test_prompt_records_time_and_version() {
        let f = fixture(PolicyConfig::new("1.0").unwrap());

        assert!(evaluate(&f.policy));

        let state = f.policy.state().unwrap();
        assert_eq!(state.last_review_prompt_at, Some(start()));
        assert_eq!(state.last_review_prompt_version.as_deref(), Some("1.0"));
        assert_eq!(f.policy.days_since_last_prompt().unwrap(), 0);
    }

    #[test]
    fn test_same_version_never_prompts_twice() {
        let f = fixture(PolicyConfig::new("1.0").unwrap());

        assert!(evaluate(&f.policy));
        f.clock.advance(Duration::days(1000));
        assert!(!evaluate(&f.policy));
        assert_eq!(f.trigger.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_new_version_still_waits_for_cooldown() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = Arc::new(MemoryStore::new());
        let trigger = Arc::new(CountingTrigger::default());

        let v1 = ReviewPolicy::new(
            PolicyConfig::new("1.0").unwrap(),
            store.clone(),
            Prompter::new(trigger.clone()).with_delay(std::time::Duration::ZERO),
        )
        .with_clock(clock.clone());
        assert!(evaluate(&v1));

        let v2 = ReviewPolicy::new(
            PolicyConfig::new("1.1").unwrap(),
            store.clone(),
            Prompter::new(trigger.clone()).with_delay(std::time::Duration::ZERO),
        )
        .with_clock(clock.clone());

        clock.advance(Duration::days(1));
        assert!(!evaluate(&v2));
        let eligibility = v2.eligibility().unwrap();
        assert!(eligibility.version_met);
        assert!(!eligibility.cooldown_met);

        clock.advance(Duration::days(124));
        assert!(evaluate(&v2));
        assert_eq!(trigger.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_request_immediately_leaves_state_untouched() {
        let f = fixture(PolicyConfig::new("1.0").unwrap());

        f.policy.request_immediately(&PromptRequest::direct());
        f.policy.request_immediately(&PromptRequest::direct_in("main"));

        assert_eq!(f.trigger.calls.load(Ordering::SeqCst), 2);
        assert_eq!(f.policy.state().unwrap(), PersistedState::default());
        assert!(f.store.is_empty());
    }

    #[test]
    fn test_eligibility_does_not_mutate() {
        let f = fixture(PolicyConfig::new("1.0").unwrap());

        let eligibility = f.policy.eligibility().unwrap();
        assert!(eligibility.is_eligible());
        assert!(f.store.is_empty());
    }

    #[test]
    fn test_clock_moving_backwards_suppresses() {
        let f = fixture(PolicyConfig::new("1.0").unwrap().with_min_launches(2));

        assert!(!evaluate(&f.policy));
        f.clock.advance(Duration::days(-3));
        assert!(!evaluate(&f.policy));
        assert!(!f.policy.eligibility().unwrap().days_since_first_launch_met);
    }

    #[test]
    fn test_reset_clears_state() {
        let f = fixture(PolicyConfig::new("1.0").unwrap());

        assert!(evaluate(&f.policy));
        f.policy.reset().unwrap();

        assert_eq!(f.policy.state().unwrap(), PersistedState::default());
        assert!(evaluate(&f.policy));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = Arc::new(MemoryStore::new());
        let mut mock = MockReviewTrigger::new();
        mock.expect_is_available().return_const(true);
        mock.expect_request_review().times(1).return_const(());
        let trigger: Arc<dyn ReviewTrigger> = Arc::new(mock);

        let a = ReviewPolicy::new(
            PolicyConfig::new("1.0").unwrap(),
            store.clone(),
            Prompter::new(trigger.clone()).with_delay(std::time::Duration::ZERO),
        )
        .with_namespace("a");
        let b = ReviewPolicy::new(
            PolicyConfig::new("1.0").unwrap().with_min_launches(2),
            store.clone(),
            Prompter::new(trigger).with_delay(std::time::Duration::ZERO),
        )
        .with_namespace("b");

        assert!(evaluate(&a));
        assert!(!evaluate(&b));
        assert_eq!(a.state().unwrap().launch_count, 1);
        assert_eq!(b.state().unwrap().launch_count, 1);
        assert!(b.state().unwrap().last_review_prompt_version.is_none());
    }

    #[test]
    fn test_blank_version_rejected() {
        assert!(PolicyConfig::new("").is_err());
    }

    #[test]
    fn test_policy_config_getters() {
        let config = PolicyConfig::new("1.0 ")
            .unwrap()
            .with_min_launches(4)
            .with_min_days_since_first_launch(2)
            .with_cooldown_days(30);

        assert_eq!(config.min_launches(), 4);
        assert_eq!(config.min_days_since_first_launch(), 2);
        assert_eq!(config.cooldown_days(), 30);
        assert_eq!(config.current_app_version(), "1.0 ");
        assert_eq!(PolicyConfig::new("1.0").unwrap().cooldown_days(), DEFAULT_COOLDOWN_DAYS);
    }

    struct Declining {
        shown: AtomicUsize,
        can_present: bool,
    }

    impl ConfirmationPresenter for Declining {
        fn present(
            &self,
            _surface: &SurfaceId,
            _copy: &PromptCopy,
            on_decline: PromptCallback,
            _on_accept: PromptCallback,
        ) -> bool {
            if !self.can_present {
                return false;
            }
            self.shown.fetch_add(1, Ordering::SeqCst);
            on_decline();
            true
        }
    }

    #[test]
    fn test_prompt_recorded_even_when_user_declines() {
        for can_present in [true, false] {
            let clock = Arc::new(ManualClock::new(start()));
            let trigger = Arc::new(CountingTrigger::default());
            let presenter = Arc::new(Declining {
                shown: AtomicUsize::new(0),
                can_present,
            });
            let prompter = Prompter::new(trigger.clone())
                .with_delay(std::time::Duration::ZERO)
                .with_presenter(presenter.clone());
            let policy = ReviewPolicy::new(
                PolicyConfig::new("1.0").unwrap(),
                Arc::new(MemoryStore::new()),
                prompter,
            )
            .with_clock(clock.clone());

            let request = PromptRequest::confirm_first("main");
            assert!(policy.evaluate_and_maybe_prompt(&request).unwrap());

            let state = policy.state().unwrap();
            assert_eq!(state.last_review_prompt_at, Some(start()));
            assert_eq!(state.last_review_prompt_version.as_deref(), Some("1.0"));
            assert_eq!(trigger.calls.load(Ordering::SeqCst), 0);
            assert_eq!(presenter.shown.load(Ordering::SeqCst), usize::from(can_present));

            clock.advance(Duration::days(200));
            assert!(!policy.evaluate_and_maybe_prompt(&request).unwrap());
        }
    }

    struct StoreReadingTrigger {
        store: Arc<MemoryStore>,
        seen: std::sync::Mutex<Vec<Option<String>>>,
    }

    impl ReviewTrigger for StoreReadingTrigger {
        fn request_review(&self, _surface: Option<SurfaceId>) {
            let version = self
                .store
                .get_string(&StateKey::LastReviewPromptVersion.storage_key(DEFAULT_NAMESPACE))
                .unwrap();
            self.seen.lock().unwrap().push(version);
        }
    }

    #[test]
    fn test_prompt_recorded_before_trigger_runs() {
        let store = Arc::new(MemoryStore::new());
        let trigger = Arc::new(StoreReadingTrigger {
            store: store.clone(),
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let policy = ReviewPolicy::new(
            PolicyConfig::new("3.2").unwrap(),
            store.clone(),
            Prompter::new(trigger.clone()).with_delay(std::time::Duration::ZERO),
        );

        assert!(evaluate(&policy));
        assert_eq!(*trigger.seen.lock().unwrap(), vec![Some("3.2".to_string())]);
    }

    #[test]
    fn test_eligibility_clauses() {
        let config = PolicyConfig::new("2.0").unwrap().with_min_launches(1);
        let now = start();
        let state = PersistedState {
            launch_count: 1,
            first_launch_at: Some(now - Duration::days(200)),
            last_review_prompt_at: Some(now - Duration::days(125)),
            last_review_prompt_version: Some("1.0".to_string()),
        };

        assert!(Eligibility::evaluate(&state, &config, now).is_eligible());

        let recent = PersistedState {
            last_review_prompt_at: Some(now - Duration::days(124)),
            ..state.clone()
        };
        assert!(!Eligibility::evaluate(&recent, &config, now).cooldown_met);

        let same_version = PersistedState {
            last_review_prompt_version: Some("2.0".to_string()),
            ..state
        };
        assert!(!Eligibility::evaluate(&same_version, &config, now).version_met);
    }
}

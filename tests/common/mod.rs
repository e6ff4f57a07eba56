//! Shared test utilities for Examen integration tests.
//!
//! Provides a scripted backend agent, the canonical "mutex" question and a
//! harness wiring the full examine pipeline over in-memory stores.

#![allow(dead_code)]

use async_trait::async_trait;
use examen::agent::{AgentError, AgentProfile, Completion, CompletionAgent, Invocation};
use examen::config::ExamenConfig;
use examen::exam::ExaminationService;
use examen::ledger::InMemoryLedger;
use examen::pipeline::{build_facade, FacadeDispatcher};
use examen::routing::BackendPool;
use examen::store::{
    CanonicalAnswer, InMemoryQuestions, InMemoryRecords, InMemoryTrials, Question,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Id of the question published by [`Harness::new`]
pub const MUTEX_QUESTION_ID: i64 = 1;

/// User funded by [`Harness::new`]
pub const USER_ID: i64 = 42;

// =============================================================================
// Scripted Agent
// =============================================================================

/// Backend adapter replying from a script, then with a fixed result,
/// optionally after a delay.
pub struct ScriptedAgent {
    id: String,
    script: Mutex<VecDeque<String>>,
    reply: Result<Completion, AgentError>,
    delay: Duration,
    calls: AtomicUsize,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedAgent {
    pub fn replying(id: &str, tokens: u32, text: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            reply: Ok(Completion {
                tokens,
                text: text.to_string(),
            }),
            script: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(id: &str, error: AgentError) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            reply: Err(error),
            script: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(id: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            reply: Ok(Completion {
                tokens: 10,
                text: "最终评分\n7".to_string(),
            }),
            script: Mutex::new(VecDeque::new()),
            delay,
            calls: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
        })
    }

    /// Reply with `texts` in order (each costing `tokens`), then with the last one.
    pub fn sequence(id: &str, tokens: u32, texts: &[&str]) -> Arc<Self> {
        let last = texts.last().copied().unwrap_or_default();
        let agent = Self::replying(id, tokens, last);
        agent
            .script
            .lock()
            .unwrap()
            .extend(texts.iter().map(|t| t.to_string()));
        agent
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_invocation(&self) -> Option<Invocation> {
        self.invocations.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionAgent for ScriptedAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: "scripted".to_string(),
            model: "scripted".to_string(),
        }
    }

    async fn invoke(&self, invocation: &Invocation) -> Result<Completion, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.invocations.lock().unwrap().push(invocation.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        match (scripted, &self.reply) {
            (Some(text), Ok(completion)) => Ok(Completion {
                tokens: completion.tokens,
                text,
            }),
            _ => self.reply.clone(),
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn mutex_question() -> Question {
    Question {
        id: MUTEX_QUESTION_ID,
        title: "What is a mutex?".to_string(),
        answer: CanonicalAnswer {
            analysis: "Tests understanding of mutual exclusion".to_string(),
            basic: "A lock that lets one thread at a time into a critical section".to_string(),
            intermediate: "Futex fast path, poisoning, lock granularity".to_string(),
            advanced: "Priority inversion, fairness, lock-free alternatives".to_string(),
        },
    }
}

pub fn config_with_price(unit_price: i64) -> ExamenConfig {
    let mut config = ExamenConfig::default();
    config.pipeline.unit_price = unit_price;
    config
}

// =============================================================================
// Harness
// =============================================================================

/// Full examine pipeline over in-memory stores.
pub struct Harness {
    pub ledger: Arc<InMemoryLedger>,
    pub records: Arc<InMemoryRecords>,
    pub trials: Arc<InMemoryTrials>,
    pub questions: Arc<InMemoryQuestions>,
    pub facade: Arc<FacadeDispatcher>,
    pub service: ExaminationService,
}

impl Harness {
    pub fn new(agents: &[Arc<ScriptedAgent>], balance: i64, unit_price: i64) -> Self {
        Self::with_config(agents, balance, &config_with_price(unit_price))
    }

    pub fn with_config(agents: &[Arc<ScriptedAgent>], balance: i64, config: &ExamenConfig) -> Self {
        let pool = BackendPool::new(
            "scripted",
            agents
                .iter()
                .map(|a| Arc::clone(a) as Arc<dyn CompletionAgent>)
                .collect(),
        )
        .unwrap();

        let ledger = Arc::new(InMemoryLedger::with_balance(USER_ID, balance));
        let records = Arc::new(InMemoryRecords::new());
        let trials = Arc::new(InMemoryTrials::new());
        let questions = Arc::new(InMemoryQuestions::new());
        questions.publish(mutex_question());

        let facade = Arc::new(build_facade(config, pool, ledger.clone(), records.clone()));
        let service = ExaminationService::new(questions.clone(), trials.clone(), facade.clone());

        Self {
            ledger,
            records,
            trials,
            questions,
            facade,
            service,
        }
    }
}

//! Examine command implementation
//!
//! Runs one examination end to end against the configured provider, with
//! in-memory ledger and stores seeded for the examining user.

use crate::agent::factory::create_provider_agents;
use crate::cli::{read_arg_or_stdin, ExamineArgs};
use crate::config::ExamenConfig;
use crate::exam::{Examination, ExaminationService};
use crate::ledger::{CreditLedger, InMemoryLedger};
use crate::logging::init_tracing;
use crate::pipeline::build_facade;
use crate::routing::BackendPool;
use crate::store::{InMemoryQuestions, InMemoryRecords, InMemoryTrials, Question};
use anyhow::{anyhow, bail, Context};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(args: &ExamineArgs) -> anyhow::Result<ExamenConfig> {
    let mut config = if args.config.exists() {
        ExamenConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        ExamenConfig::default()
    };

    config = config.with_env_overrides();

    if let Some(ref provider) = args.provider {
        config.pipeline.provider = provider.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if let Some(balance) = args.balance {
        config.credit.initial_balance = balance;
    }

    config.validate()?;
    Ok(config)
}

/// Read a question definition from a TOML file
pub fn load_question(path: &Path) -> anyhow::Result<Question> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read question file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Invalid question file {}", path.display()))
}

/// Handle `examen examine`
pub async fn run_examine(args: ExamineArgs) -> anyhow::Result<()> {
    let config = load_config_with_overrides(&args)?;
    init_tracing(&config.logging).map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    let question = load_question(&args.question)?;
    let answer = read_arg_or_stdin(&args.answer).context("Failed to read answer")?;
    let question_id = question.id;

    let provider = config
        .active_provider()
        .ok_or_else(|| anyhow!("Unknown provider '{}'", config.pipeline.provider))?;
    let agents = create_provider_agents(provider, Arc::new(Client::new()))?;
    let pool = BackendPool::new(provider.name.clone(), agents)?;
    tracing::info!(provider = %provider.name, adapters = pool.len(), "Backend pool ready");

    let ledger = Arc::new(InMemoryLedger::with_balance(
        args.user,
        config.credit.initial_balance,
    ));
    let questions = Arc::new(InMemoryQuestions::new());
    questions.publish(question);

    let facade = build_facade(
        &config,
        pool,
        ledger.clone(),
        Arc::new(InMemoryRecords::new()),
    );
    let service = ExaminationService::new(questions, Arc::new(InMemoryTrials::new()), Arc::new(facade))
        .with_timeout(config.request_timeout());

    match service.examine(args.user, question_id, &answer).await {
        Ok(examination) => {
            let balance = ledger.balance(args.user).await?;
            println!("{}", render(&examination, balance, args.json)?);
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Examination failed");
            let public = e.public_error();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&public)?);
            }
            bail!("{} ({})", public.message, public.code)
        }
    }
}

fn render(examination: &Examination, balance: i64, json: bool) -> anyhow::Result<String> {
    if json {
        let mut value = serde_json::to_value(examination)?;
        value["balance"] = serde_json::json!(balance);
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    Ok(format!(
        "Outcome: {}\nBest:    {}\nTokens:  {}\nCost:    {}\nBalance: {}\nTrial:   {}\n\n{}",
        examination.outcome,
        examination.best,
        examination.tokens,
        examination.cost,
        balance,
        examination.trial_id,
        examination.raw_answer.trim()
    ))
}

use std::sync::Arc;

use inbox_triage::audit::AuditLog;
use inbox_triage::config::TriageConfig;
use inbox_triage::error::RulesError;
use inbox_triage::llm::{Classifier, LlmConfig, create_provider};
use inbox_triage::mailbox::{GmailCredentials, GmailMailbox};
use inbox_triage::pipeline::{TriageCycle, TriageService};
use inbox_triage::rules::RuleSet;
use inbox_triage::rules::loader::RulesStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Read API key from environment
    let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_else(|_| {
        eprintln!("Error: ANTHROPIC_API_KEY not set");
        eprintln!("  export ANTHROPIC_API_KEY=sk-ant-...");
        std::process::exit(1);
    });

    let gmail_credentials = GmailCredentials::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let config = TriageConfig::from_env();

    eprintln!("📬 Inbox Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Config dir: {}", config.config_dir.display());
    eprintln!(
        "   Rules: {}",
        match config.remote_rules {
            Some(ref remote) => format!("remote ({}) with local fallback", remote.repo),
            None => "local".to_string(),
        }
    );
    eprintln!("   Fallback policy: {}", config.fallback.label());
    eprintln!(
        "   Poll every {}s, cooldown {}s\n",
        config.poll_interval.as_secs(),
        config.cooldown.as_secs()
    );

    // Create LLM provider + classifier
    let llm_config = LlmConfig {
        api_key: secrecy::SecretString::from(api_key),
        model: config.model.clone(),
    };
    let provider = create_provider(&llm_config);
    let classifier = Classifier::new(provider, config.fallback, config.llm_min_interval);

    let mailbox = Arc::new(GmailMailbox::new(gmail_credentials));
    let rules = RulesStore::new(&config.config_dir, config.remote_rules.clone());
    let audit = AuditLog::new(config.audit_log_path());

    // Validate the rules document once before entering the loop: a document
    // with no categories is a configuration error, not something to retry.
    let document = rules.load().await?;
    let ruleset = RuleSet::parse(&document)?;
    if ruleset.categories.is_empty() {
        return Err(RulesError::NoCategories.into());
    }
    eprintln!(
        "   Categories: {} ({} skip rules)\n",
        ruleset.categories.join(", "),
        ruleset.skip_rules.len()
    );

    let cycle = TriageCycle::new(mailbox, classifier, rules, audit);
    let service = TriageService::new(cycle, config.poll_interval, config.cooldown);
    service.run().await;

    Ok(())
}

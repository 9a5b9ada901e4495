//! Subcommand implementations

use anyhow::Context;
use chrono::{Local, NaiveDateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use safenav_core::{BlockDecision, ContentFilterMode, ScheduleRule};
use safenav_policy::{NavigationGuard, PolicyEngine, PolicyRefresher, SnapshotCache};
use safenav_store::{BlockingStore, FileStore};
use safenav_telemetry::{AuditService, AuditStats, MetricsCollector};

use crate::cli::{ListAction, ScheduleAction};
use crate::config::AppConfig;

pub type Store = Arc<BlockingStore<FileStore>>;

/// Which stored list a [`ListAction`] applies to
#[derive(Debug, Clone, Copy)]
pub enum ListKind {
    Domain,
    Keyword,
    Whitelist,
}

impl ListKind {
    fn label(self) -> &'static str {
        match self {
            ListKind::Domain => "blocked domain",
            ListKind::Keyword => "blocked keyword",
            ListKind::Whitelist => "whitelisted domain",
        }
    }
}

pub async fn open_store(config: &AppConfig) -> anyhow::Result<Store> {
    let kv = FileStore::open(&config.store_path)
        .await
        .with_context(|| format!("opening store {}", config.store_path.display()))?;
    Ok(Arc::new(BlockingStore::new(kv)))
}

fn build_refresher(config: &AppConfig, store: &Store, cache: Arc<SnapshotCache>) -> PolicyRefresher {
    PolicyRefresher::new(store.clone(), Arc::new(config.prayer_source()), cache)
        .with_interval(config.refresh_interval())
}

fn describe(decision: &BlockDecision) -> String {
    match (decision.reason, decision.blocked_by.as_deref()) {
        (Some(reason), Some(by)) if decision.blocked => {
            format!("BLOCKED  reason={reason} by={by} ({})", reason.message_key())
        }
        _ => "ALLOWED".to_string(),
    }
}

pub async fn check(
    config: &AppConfig,
    store: Store,
    urls: &[String],
    at: Option<NaiveDateTime>,
    record: bool,
    json: bool,
) -> anyhow::Result<()> {
    let now = at.unwrap_or_else(|| Local::now().naive_local());
    let cache = Arc::new(SnapshotCache::default());
    build_refresher(config, &store, cache.clone())
        .refresh_at(now)
        .await
        .context("loading policy")?;

    let mut guard = NavigationGuard::new(PolicyEngine::with_config(config.engine_config()), cache);
    let audit = if record {
        let service = Arc::new(AuditService::new(store.clone())?);
        guard = guard.with_reporter(service.clone());
        Some(service)
    } else {
        None
    };

    for url in urls {
        let decision = guard.check_at(url, now);
        if json {
            println!("{}", serde_json::to_string(&decision)?);
        } else {
            println!("{url}  {}", describe(&decision));
        }
    }

    if let Some(audit) = audit {
        audit.flush().await;
    }
    Ok(())
}

pub async fn manage_list(store: Store, kind: ListKind, action: ListAction) -> anyhow::Result<()> {
    match action {
        ListAction::Add { value } => {
            let added = match kind {
                ListKind::Domain => store.add_blocked_domain(&value).await?,
                ListKind::Keyword => store.add_blocked_keyword(&value).await?,
                ListKind::Whitelist => store.add_whitelist_domain(&value).await?,
            };
            if added {
                println!("Added {} {value}", kind.label());
            } else {
                println!("{value} is already a {}", kind.label());
            }
        }
        ListAction::Remove { value } => {
            let removed = match kind {
                ListKind::Domain => store.remove_blocked_domain(&value).await?,
                ListKind::Keyword => store.remove_blocked_keyword(&value).await?,
                ListKind::Whitelist => store.remove_whitelist_domain(&value).await?,
            };
            if removed {
                println!("Removed {} {value}", kind.label());
            } else {
                println!("{value} is not a {}", kind.label());
            }
        }
        ListAction::List => {
            let values = match kind {
                ListKind::Domain => store.blocked_domains().await?,
                ListKind::Keyword => store.blocked_keywords().await?,
                ListKind::Whitelist => store.whitelist_domains().await?,
            };
            for value in values {
                println!("{value}");
            }
        }
    }
    Ok(())
}

pub async fn set_strict(store: Store, enabled: bool) -> anyhow::Result<()> {
    store.set_strict_mode(enabled).await?;
    println!("Strict mode {}", if enabled { "on" } else { "off" });
    Ok(())
}

pub async fn schedule(store: Store, action: ScheduleAction) -> anyhow::Result<()> {
    let schedule = match action {
        ScheduleAction::Show => store.schedule().await?,
        ScheduleAction::Enable => Some(store.set_schedule_enabled(true).await?),
        ScheduleAction::Disable => Some(store.set_schedule_enabled(false).await?),
        ScheduleAction::Override { state } => Some(store.set_temporary_override(state.enabled()).await?),
        ScheduleAction::AddRule {
            days,
            start,
            end,
            deny,
        } => {
            let mut rule = ScheduleRule::allow(days, start, end);
            rule.is_allowed = !deny;
            Some(store.add_schedule_rule(rule).await?)
        }
        ScheduleAction::Clear => {
            store.clear_schedule().await?;
            None
        }
    };

    match schedule {
        Some(schedule) => println!("{}", serde_yaml::to_string(&schedule)?),
        None => println!("No schedule configured"),
    }
    Ok(())
}

pub async fn set_filter(store: Store, mode: ContentFilterMode) -> anyhow::Result<()> {
    let settings = store.set_content_filter_mode(mode).await?;
    println!("Content filter mode {}", settings.content_filter_mode);
    Ok(())
}

pub async fn history(store: Store, limit: usize, clear: bool) -> anyhow::Result<()> {
    if clear {
        store.clear_history().await?;
        println!("History cleared");
        return Ok(());
    }
    for entry in store.history().await?.into_iter().take(limit) {
        let status = match (entry.reason, entry.blocked_by.as_deref()) {
            (Some(reason), Some(by)) if entry.was_blocked => format!("blocked:{reason}:{by}"),
            _ => "visited".to_string(),
        };
        println!(
            "{}  {status}  {}  {}",
            entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            entry.url,
            entry.title
        );
    }
    Ok(())
}

pub async fn blocked(store: Store, limit: usize, clear: bool) -> anyhow::Result<()> {
    if clear {
        store.clear_blocked_attempts().await?;
        println!("Blocked attempts cleared");
        return Ok(());
    }
    for attempt in store.blocked_attempts().await?.into_iter().take(limit) {
        println!(
            "{}  {}  {}  {}",
            attempt.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            attempt.reason,
            attempt.blocked_by,
            attempt.url
        );
    }
    Ok(())
}

pub async fn stats(store: Store, json: bool) -> anyhow::Result<()> {
    let attempts = store.blocked_attempts().await?;
    let stats = AuditStats::from_attempts(&attempts, Utc::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Blocked attempts: {} ({} in the last 24h)", stats.total, stats.last_24h);
    for (reason, count) in &stats.by_reason {
        println!("  {reason:<10} {count}");
    }
    if !stats.top_blocked_by.is_empty() {
        println!("Most frequent:");
        for entry in &stats.top_blocked_by {
            println!("  {:<30} {}", entry.blocked_by, entry.count);
        }
    }
    Ok(())
}

pub async fn watch(config: &AppConfig, store: Store, prometheus: bool) -> anyhow::Result<()> {
    let prometheus = if prometheus { Some(crate::init_metrics()?) } else { None };

    let cache = Arc::new(SnapshotCache::default());
    let refresher = build_refresher(config, &store, cache.clone());
    refresher.refresh_once().await.context("loading policy")?;
    let refresh_task = refresher.spawn();

    let audit = Arc::new(AuditService::new(store.clone())?);
    let guard = NavigationGuard::new(PolicyEngine::with_config(config.engine_config()), cache)
        .with_reporter(audit.clone());
    let metrics = MetricsCollector::new();

    info!("Watching stdin for URLs");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let url = line.trim();
                if url.is_empty() {
                    continue;
                }

                let started = Instant::now();
                let decision = guard.check(url);
                metrics.record_latency(started.elapsed().as_micros() as u64);
                metrics.record_decision(&decision);

                if !decision.blocked {
                    guard.record_visit(url, "");
                }
                println!("{url}  {}", describe(&decision));
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping watch");
                break;
            }
        }
    }

    refresh_task.abort();
    audit.flush().await;

    let snapshot = metrics.snapshot();
    eprintln!(
        "{} evaluated, {} allowed, {} blocked ({:.1}%), avg {}us",
        snapshot.evaluations,
        snapshot.allowed,
        snapshot.total_blocked(),
        snapshot.block_rate() * 100.0,
        snapshot.avg_latency_us()
    );
    for (reason, count) in &snapshot.blocked {
        eprintln!("  {reason:<10} {count}");
    }

    if let Some(handle) = prometheus {
        print!("{}", handle.render());
    }
    Ok(())
}

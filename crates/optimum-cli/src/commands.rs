//! Command implementations.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};

use anyhow::{bail, Context as _, Result};
use serde_json::{Map, Value};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use optimum_client::{ClientError, JobPoller, OptimumClient, VectorWriter, WriterConfig};
use optimum_types::{Cask, Instances, Job, JobStatus, Query, QueryResult, Receipt, Settings, Vector};

use crate::cli::Cli;
use crate::scanner::Scanner;

/// Everything a command needs: settings, a client and the shared
/// cancellation token.
pub struct Context {
    pub settings: Settings,
    pub client: OptimumClient,
    pub cancel: CancellationToken,
}

/// Prepare a command run.
///
/// 1. Load configuration (defaults -> file -> env -> CLI)
/// 2. Initialize logging
/// 3. Build the client
/// 4. Cancel the shared token on Ctrl+C
pub fn init(cli: &Cli) -> Result<Context> {
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(host) = &cli.host {
        settings.host = host.clone();
    }
    if let Some(token) = &cli.token {
        settings.token = Some(token.clone());
    }
    if let Some(log_level) = &cli.log_level {
        settings.log_level = log_level.clone();
    }
    settings.validate().context("Invalid configuration")?;

    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let client = OptimumClient::from_settings(&settings).context("Failed to build client")?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling...");
            trigger.cancel();
        }
    });

    Ok(Context {
        settings,
        client,
        cancel,
    })
}

fn parse_cask(cask: &str) -> Result<Cask> {
    cask.parse()
        .with_context(|| format!("Invalid cask {:?}, expected class:name", cask))
}

/// Print all instances of a class.
pub async fn list(ctx: &Context, class: &str) -> Result<()> {
    let instances = ctx.client.list(class).await?;
    print!("{}", format_instances(&instances));
    Ok(())
}

/// Create a cask and wait until the job is terminal.
pub async fn create(ctx: &Context, cask: &str, opts_path: Option<&str>) -> Result<()> {
    let cask = parse_cask(cask)?;

    let opts: Map<String, Value> = match opts_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read options from {}", path))?;
            serde_json::from_str(&raw).with_context(|| format!("Invalid options in {}", path))?
        }
        None => Map::new(),
    };

    let receipt = ctx.client.create(&cask, &opts).await?;
    println!("{} (vsn {}) | CREATING ...", cask, receipt.version);
    wait(ctx, &cask, &receipt).await
}

/// Commit uploaded data and wait until the job is terminal.
pub async fn commit(ctx: &Context, cask: &str) -> Result<()> {
    let cask = parse_cask(cask)?;
    let receipt = ctx.client.commit(&cask).await?;
    println!("{} (vsn {}) | COMMITTING ...", cask, receipt.version);
    wait(ctx, &cask, &receipt).await
}

async fn wait(ctx: &Context, cask: &Cask, receipt: &Receipt) -> Result<()> {
    let poller = JobPoller::from_settings(ctx.client.clone(), &ctx.settings);
    let status = poller
        .wait_with(&receipt.job, &ctx.cancel, |s| {
            info!(cask = %cask, job = %receipt.job, status = %s.status, "Job progress");
        })
        .await?;

    println!("{}", format_status(cask, &receipt.version, &status));
    if !status.is_succeeded() {
        bail!("Job {} failed: {}", receipt.job, status.reason);
    }
    Ok(())
}

/// Remove a cask.
pub async fn remove(ctx: &Context, cask: &str) -> Result<()> {
    let cask = parse_cask(cask)?;
    ctx.client.remove(&cask).await?;
    println!("{} | REMOVED", cask);
    Ok(())
}

/// Stream vectors from a text file into a cask.
///
/// Data becomes visible only after a commit.
pub async fn upload(ctx: &Context, cask: &str, chunk: Option<usize>, path: &str) -> Result<()> {
    let cask = parse_cask(cask)?;
    let file = fs::File::open(path).with_context(|| format!("Failed to open {}", path))?;

    let mut config = WriterConfig::from(&ctx.settings);
    if let Some(chunk) = chunk {
        config.chunk_bytes = chunk;
    }

    let mut writer = VectorWriter::new(ctx.client.clone(), cask.clone(), config);
    let mut count: u64 = 0;

    for record in Scanner::new(BufReader::new(file)) {
        let (key, vector) = record.with_context(|| format!("Failed to scan {}", path))?;
        if let Err(e) = writer.write(Vector::new(key, vector), &ctx.cancel).await {
            let dropped = writer.discard();
            warn!(cask = %cask, written = count, dropped, "Upload aborted");
            return Err(e.into());
        }
        count += 1;
    }

    if let Err(e) = writer.sync(&ctx.cancel).await {
        let dropped = writer.discard();
        warn!(cask = %cask, written = count, dropped, "Upload aborted");
        return Err(e.into());
    }

    let (segments, bytes) = writer.segment().flushed();
    println!(
        "{} | uploaded {} vectors in {} segments ({} bytes), commit to publish",
        cask, count, segments, bytes
    );
    Ok(())
}

/// Send vectors from a text file in bags of `chunk` records through the
/// object endpoint.
///
/// Each bag is visible to the service once accepted; a commit publishes it.
pub async fn stream(ctx: &Context, cask: &str, chunk: usize, path: &str) -> Result<()> {
    let cask = parse_cask(cask)?;
    let file = fs::File::open(path).with_context(|| format!("Failed to open {}", path))?;
    let config = WriterConfig::from(&ctx.settings);

    let (records, bags) = stream_bags(
        &ctx.client,
        &cask,
        &config,
        chunk,
        BufReader::new(file),
        &ctx.cancel,
    )
    .await
    .with_context(|| format!("Failed to stream {}", path))?;

    println!(
        "{} | streamed {} vectors in {} bags, commit to publish",
        cask, records, bags
    );
    Ok(())
}

/// Scan `reader` and send its records in bags of at most `chunk`.
///
/// Oversized keys follow the key policy of `config`. Returns the number of
/// records and bags sent. Bags sent before an error stay on the service.
pub async fn stream_bags<R: BufRead>(
    client: &OptimumClient,
    cask: &Cask,
    config: &WriterConfig,
    chunk: usize,
    reader: R,
    cancel: &CancellationToken,
) -> Result<(u64, u64)> {
    let chunk = chunk.max(1);
    let mut bag = Vec::with_capacity(chunk);
    let (mut records, mut bags) = (0u64, 0u64);

    for record in Scanner::new(reader) {
        let (key, vector) = record?;
        bag.push(config.admit(Vector::new(key, vector))?);

        if bag.len() >= chunk {
            send_bag(client, cask, &bag, cancel).await?;
            records += bag.len() as u64;
            bags += 1;
            bag.clear();
        }
    }

    if !bag.is_empty() {
        send_bag(client, cask, &bag, cancel).await?;
        records += bag.len() as u64;
        bags += 1;
    }

    Ok((records, bags))
}

async fn send_bag(
    client: &OptimumClient,
    cask: &Cask,
    bag: &[Vector],
    cancel: &CancellationToken,
) -> Result<(), ClientError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        r = client.put_vectors(cask, bag) => r,
    }
}

/// Run one nearest-neighbor query per line of a text file.
///
/// With a text map, the text behind the query key and every hit key is
/// printed after the hits.
pub async fn query(
    ctx: &Context,
    cask: &str,
    k: Option<u32>,
    ef_search: Option<u32>,
    distance: Option<f32>,
    text_map: Option<&str>,
    path: &str,
) -> Result<()> {
    let cask = parse_cask(cask)?;

    let texts = match text_map {
        Some(map) => {
            let file = fs::File::open(map).with_context(|| format!("Failed to open {}", map))?;
            let texts = load_text_map(BufReader::new(file))
                .with_context(|| format!("Failed to read {}", map))?;
            Some(texts)
        }
        None => None,
    };

    let file = fs::File::open(path).with_context(|| format!("Failed to open {}", path))?;

    for record in Scanner::new(BufReader::new(file)) {
        let (key, vector) = record.with_context(|| format!("Failed to scan {}", path))?;
        let query = Query {
            k,
            ef_search,
            distance,
            ..Query::new(vector)
        };

        let result = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => bail!("Cancelled"),
            r = ctx.client.query(&cask, &query) => r?,
        };
        print!("{}", format_query_result(&key, &result));
        if let Some(texts) = &texts {
            print!("{}", format_text_hits(&key, &result, texts));
        }
    }

    Ok(())
}

/// Read a map of `key text` lines, split at the first space.
///
/// Lines without a text are skipped.
pub fn load_text_map<R: BufRead>(reader: R) -> Result<HashMap<String, String>> {
    let mut texts = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        if let Some((key, text)) = line.trim_end().split_once(' ') {
            texts.insert(key.to_string(), text.to_string());
        }
    }
    Ok(texts)
}

/// Text behind a key: looked up as `0x<hex>` first, then as the raw key.
/// Falls back to the hex label.
fn text_of(key: &[u8], texts: &HashMap<String, String>) -> String {
    let label = format!("0x{}", hex::encode(key));
    texts
        .get(&label)
        .or_else(|| texts.get(&*String::from_utf8_lossy(key)))
        .cloned()
        .unwrap_or(label)
}

/// Render the texts behind a query and its hits.
pub fn format_text_hits(
    key: &[u8],
    result: &QueryResult,
    texts: &HashMap<String, String>,
) -> String {
    let mut out = format!("\nQuery (took {:?}) > {}\n", result.took, text_of(key, texts));
    for hit in &result.hits {
        out.push_str(&format!(
            "  {:.6} : {}\n",
            hit.rank,
            text_of(&hit.unique_key, texts)
        ));
    }
    out
}

/// Print a single status snapshot of a job.
pub async fn status(ctx: &Context, job: &str) -> Result<()> {
    let job = Job::new(job);
    let status = ctx.client.status(&job).await?;
    println!("{} | {}", job, status.status);
    if !status.reason.is_empty() {
        println!("  reason:  {}", status.reason);
    }
    for (label, at) in [
        ("created", &status.created),
        ("started", &status.started),
        ("stopped", &status.stopped),
    ] {
        if !at.is_empty() {
            println!("  {}: {}", label, at);
        }
    }
    Ok(())
}

/// Render the instance table.
pub fn format_instances(instances: &Instances) -> String {
    let mut out = format!(
        "{:<10}\t{:<16} {:<19} | {:<11} {:<16} | {}\n",
        "NAME", "VERSION", "UPDATED AT", "STATUS", "PENDING", "PARAMS"
    );
    for x in &instances.items {
        let updated = x
            .updated
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "{:<10}\t{:<16} {:<19} | {:<11} {:<16} | {}\n",
            x.id.name(),
            x.version,
            updated,
            x.status,
            x.pending,
            x.opts
        ));
    }
    out
}

/// Render the hits of one query.
pub fn format_query_result(key: &[u8], result: &QueryResult) -> String {
    let mut out = format!(
        "Query {} (took {:?}) | {} (vsn {}, size {})\n",
        String::from_utf8_lossy(key),
        result.took,
        result.source.cask,
        result.source.version,
        result.source.size
    );
    for hit in &result.hits {
        out.push_str(&format!(
            "  {:>32} : {:.6} | {}\n",
            String::from_utf8_lossy(&hit.unique_key),
            hit.rank,
            hex::encode(&hit.unique_key)
        ));
    }
    out
}

fn format_status(cask: &Cask, version: &str, status: &JobStatus) -> String {
    if status.reason.is_empty() {
        format!("{} (vsn {}) | {}", cask, version, status.status)
    } else {
        format!(
            "{} (vsn {}) | {}: {}",
            cask, version, status.status, status.reason
        )
    }
}

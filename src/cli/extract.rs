use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use carttotal_core_types::{Selector, SystemClock};
use clap::Args;
use perceiver_price::{is_checkout_page, HtmlDocument};
use serde::Serialize;
use tokio::fs;
use url::Url;

use crate::cli::context::CliContext;
use crate::orchestrator::{Strategy, TotalExtractor};

#[derive(Args, Clone, Debug)]
pub struct ExtractArgs {
    /// Saved HTML of the rendered page
    #[arg(long, value_name = "FILE")]
    pub html: PathBuf,

    /// Address the page was loaded from; its host keys the selector cache
    #[arg(long)]
    pub url: String,

    /// Page title (defaults to the document's <title>)
    #[arg(long)]
    pub title: Option<String>,

    /// Model reply for the scripted provider, one per window (repeatable)
    #[arg(long = "response", value_name = "FILE")]
    pub responses: Vec<PathBuf>,

    /// Probe keyword selectors when the model finds nothing
    #[arg(long)]
    pub heuristic: bool,
}

#[derive(Debug, Serialize)]
struct ExtractReport {
    url: String,
    domain: String,
    title: String,
    checkout_page: bool,
    candidates: usize,
    amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<Strategy>,
    selectors: Vec<Selector>,
}

pub async fn cmd_extract(args: ExtractArgs, ctx: &CliContext) -> Result<()> {
    let url = Url::parse(&args.url).with_context(|| format!("parsing URL {}", args.url))?;
    let domain = url
        .host_str()
        .with_context(|| format!("{} has no host", args.url))?
        .to_string();

    let source = fs::read_to_string(&args.html)
        .await
        .with_context(|| format!("reading {}", args.html.display()))?;
    let mut replies = Vec::with_capacity(args.responses.len());
    for path in &args.responses {
        let reply = fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        replies.push(reply);
    }

    let extractor = TotalExtractor::from_config(
        ctx.config(),
        ctx.store().await?,
        ctx.model(replies)?,
        Arc::new(SystemClock),
    )
    .with_heuristic_fallback(args.heuristic || ctx.config().heuristic_fallback);

    let doc = HtmlDocument::parse(&source);
    let title = args
        .title
        .clone()
        .or_else(|| doc.title())
        .unwrap_or_default();
    let candidates = extractor.scanner().scan(&doc).len();
    let extraction = extractor.extract(&doc, &domain).await;

    let report = ExtractReport {
        checkout_page: is_checkout_page(url.as_str(), &title),
        url: args.url,
        domain,
        title,
        candidates,
        amount: extraction.as_ref().map(|found| found.amount),
        strategy: extraction.as_ref().map(|found| found.strategy),
        selectors: extraction.map(|found| found.selectors).unwrap_or_default(),
    };

    ctx.output().emit(&report, |report| {
        println!("Page: {} ({})", report.url, report.domain);
        if !report.title.is_empty() {
            println!("Title: {}", report.title);
        }
        println!("Checkout page: {}", if report.checkout_page { "yes" } else { "no" });
        println!("Price candidates: {}", report.candidates);
        match (report.amount, report.strategy) {
            (Some(amount), Some(strategy)) => {
                println!("Cart total: ${amount:.2} (via {strategy})");
                for selector in &report.selectors {
                    println!("  - {selector}");
                }
            }
            _ => println!("Cart total: not found"),
        }
    })
}
